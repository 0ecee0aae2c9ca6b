//! Integration tests for the queue registry and the command-facing manager

mod music_manager;
