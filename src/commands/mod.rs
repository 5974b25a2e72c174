//! Command parsing and dispatch.
//!
//! A request carries its pipeline as `name/args/name/args/...`. Each name
//! maps to one of three operation kinds:
//!
//! - **transform**: mutates the pixels of the image handle
//! - **export**: edits [`ExportOptions`]; may drop metadata but never
//!   touches pixels
//! - **request-scoped**: also sees the request query and config (watermark)
//!
//! Unknown names are skipped so old clients with private extensions keep
//! working.

use image::DynamicImage;
use std::sync::Arc;

use crate::codec::{ExportOptions, ImageHandle};
use crate::config::Config;
use crate::error::DimsError;
use crate::request::QueryParams;

pub mod adjust;
pub mod crop;
pub mod export;
pub mod orient;
pub mod resize;
pub mod sharpen;
pub mod thumbnail;
pub mod watermark;

/// One `name/args` pair from the URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: String,
}

impl Command {
    pub fn new(name: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: args.into(),
        }
    }
}

/// Split a raw command path into commands
///
/// Surrounding slashes are ignored and a trailing unpaired token is dropped.
pub fn parse_commands(raw: &str) -> Vec<Command> {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }

    let tokens: Vec<&str> = trimmed.split('/').collect();
    tokens
        .chunks_exact(2)
        .map(|pair| Command::new(pair[0], pair[1]))
        .collect()
}

/// Join commands back into `name/args/...` form
pub fn join_commands(commands: &[Command]) -> String {
    commands
        .iter()
        .map(|c| format!("{}/{}", c.name, c.args))
        .collect::<Vec<_>>()
        .join("/")
}

/// Inputs available to request-scoped commands
#[derive(Debug, Clone, Copy)]
pub struct RequestScope<'a> {
    pub query: &'a QueryParams,
    pub config: &'a Config,
    /// Overlay fetched ahead of the pipeline, when the query names one
    pub overlay: Option<&'a Arc<DynamicImage>>,
}

pub type TransformFn = fn(&mut ImageHandle, &str) -> Result<(), DimsError>;
pub type ExportFn = fn(&mut ImageHandle, &str, &mut ExportOptions) -> Result<(), DimsError>;
pub type RequestScopedFn = fn(&mut ImageHandle, &str, &RequestScope<'_>) -> Result<(), DimsError>;

/// A resolved command implementation
#[derive(Clone, Copy)]
pub enum Operation {
    Transform(TransformFn),
    Export(ExportFn),
    RequestScoped(RequestScopedFn),
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Operation::Transform(_) => "Transform",
            Operation::Export(_) => "Export",
            Operation::RequestScoped(_) => "RequestScoped",
        };
        f.write_str(kind)
    }
}

/// Look up a command by name: transforms first, then export, then request-scoped
pub fn lookup(name: &str) -> Option<Operation> {
    lookup_transform(name)
        .map(Operation::Transform)
        .or_else(|| lookup_export(name).map(Operation::Export))
        .or_else(|| lookup_request_scoped(name).map(Operation::RequestScoped))
}

fn lookup_transform(name: &str) -> Option<TransformFn> {
    let op: TransformFn = match name {
        "crop" => crop::crop,
        "resize" => resize::resize,
        "thumbnail" => thumbnail::thumbnail,
        "legacy_thumbnail" => thumbnail::legacy_thumbnail,
        "sharpen" => sharpen::sharpen,
        "brightness" => adjust::brightness,
        "flipflop" => orient::flipflop,
        "sepia" => adjust::sepia,
        "grayscale" => adjust::grayscale,
        "autolevel" => adjust::autolevel,
        "invert" => adjust::invert,
        "rotate" => orient::rotate,
        _ => return None,
    };
    Some(op)
}

fn lookup_export(name: &str) -> Option<ExportFn> {
    let op: ExportFn = match name {
        "strip" => export::strip,
        "format" => export::format,
        "quality" => export::quality,
        _ => return None,
    };
    Some(op)
}

fn lookup_request_scoped(name: &str) -> Option<RequestScopedFn> {
    match name {
        "watermark" => Some(watermark::watermark),
        _ => None,
    }
}

/// Everything an executing pipeline can read or write
pub struct Pipeline<'a> {
    pub image: &'a mut ImageHandle,
    pub options: &'a mut ExportOptions,
    pub scope: RequestScope<'a>,
    /// Error-image replay: failures are logged and request-scoped commands skipped
    pub lenient: bool,
}

impl<'a> Pipeline<'a> {
    /// Run one command; unknown names are a no-op
    pub fn execute(&mut self, command: &Command) -> Result<(), DimsError> {
        let Some(operation) = lookup(&command.name) else {
            tracing::debug!(command = %command.name, "Skipping unknown command");
            return Ok(());
        };

        tracing::debug!(command = %command.name, args = %command.args, "Executing command");
        let result = match operation {
            Operation::Transform(op) => op(self.image, &command.args),
            Operation::Export(op) => op(self.image, &command.args, self.options),
            Operation::RequestScoped(_) if self.lenient => return Ok(()),
            Operation::RequestScoped(op) => op(self.image, &command.args, &self.scope),
        };

        match result {
            Err(err) if self.lenient => {
                tracing::debug!(command = %command.name, error = %err, "Ignoring command error");
                Ok(())
            }
            other => other,
        }
    }
}
