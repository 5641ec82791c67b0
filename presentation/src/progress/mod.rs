//! Typing indicators

pub mod reporter;
