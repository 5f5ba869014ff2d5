#![doc = "post-sync-core: core logic library for post-sync."]

//! This crate contains the content reconciliation pipeline: the data model for remote
//! pages and blocks, the block-to-Markdown converter, metadata and front matter
//! handling, and the engine that keeps an output directory in step with the
//! published set. HTTP clients and the CLI live in the `post-sync` crate.
//!
//! # Usage
//! Implement [`contract::ContentSource`] for a remote API, pick a [`contract::PostStore`]
//! (usually [`store::LocalDirectory`]) and call [`synchronise::synchronise`].

pub mod blocks;
pub mod contract;
pub mod error;
pub mod fetch;
pub mod frontmatter;
pub mod identity;
pub mod metadata;
pub mod model;
pub mod richtext;
pub mod store;
pub mod synchronise;
