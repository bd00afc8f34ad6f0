#![allow(dead_code)]

pub use shellstate_test_utils::{builders, fake_executor, init_tracing, with_timeout};

use std::error::Error;

pub type TestResult = Result<(), Box<dyn Error>>;
