//! kiln is a rule-driven scaffolding engine.
//! Given a declarative rule table and a resolved generator context, it decides
//! which files to generate, where to place them and how to produce their
//! content, removes artifacts of older generation schemes, and writes the
//! result to an output tree.

/// Legacy artifact removal, organised as versioned migration steps
pub mod cleanup;

/// Command-line interface module for the kiln application
pub mod cli;

/// Block condition evaluation
pub mod condition;

/// Common constants: server roots, interpolation patterns, context file names
pub mod constants;

/// Generator context loading and derived fields
/// Supports JSON and YAML formats (.yo-rc.json, generator.json, generator.yml, generator.yaml)
pub mod context;

/// Error types and handling for the kiln application
pub mod error;

/// Generation run orchestration
pub mod generator;

/// Logger setup for the binary
pub mod logger;

/// Destination bytes for each generation mode
pub mod materializer;

/// Expression and template rendering with MiniJinja
pub mod renderer;

/// Source and destination path resolution
pub mod resolver;

/// Rule table schema, built-in server rules and declarative loading
pub mod rules;

/// Template content lookup
pub mod store;

/// Filesystem writes and overwrite policy
pub mod writer;
