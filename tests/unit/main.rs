mod cli_parse_tests;
mod config_tests;
