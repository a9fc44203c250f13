use super::test_helpers::{create_test_engine, create_test_engine_with, drain, folder, video};
use super::*;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod streaming;
