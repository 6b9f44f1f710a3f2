mod cleanup;
mod common;
