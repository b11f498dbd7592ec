mod common;
mod error_test;
mod import_test;
mod rewrite_test;
