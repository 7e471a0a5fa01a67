pub mod app;
pub mod blobstore;
pub mod compression;
pub mod config;
pub mod domain;
pub mod download;
pub mod error;
pub mod fastq;
pub mod filename;
pub mod fs_util;
pub mod library;
pub mod output;
pub mod scratch;
pub mod workspace;
