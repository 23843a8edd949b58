//! Asset minification for JS and CSS files.
//!
//! Uses oxc for JavaScript and lightningcss for CSS. Both are exposed as
//! [`Render`] implementations so minification runs through the same compile
//! action as every other dialect.

use std::path::Path;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use super::{Render, RenderOptions};
use crate::engine::CompileError;

/// Minify JavaScript source code.
pub fn minify_js(source: &str) -> Result<String, CompileError> {
    let allocator = Allocator::default();
    let source_type = SourceType::mjs();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if let Some(err) = ret.errors.first() {
        return Err(CompileError::new(err.to_string()));
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Result<String, CompileError> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default()).map_err(|err| {
        let error = CompileError::new(err.kind.to_string());
        match err.loc {
            // lightningcss lines are 0-based, columns 1-based
            Some(loc) => error.at(loc.line + 1, Some(loc.column)),
            None => error,
        }
    })?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|err| CompileError::new(err.to_string()))?;
    Ok(result.code)
}

/// Minifier kind selected by file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinifyKind {
    Css,
    Js,
}

impl MinifyKind {
    /// Kind for a type name or extension (`css`, `js`, `mjs`).
    pub fn from_type(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "css" => Some(Self::Css),
            "js" | "mjs" | "cjs" => Some(Self::Js),
            _ => None,
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Js => "js",
        }
    }
}

/// Minifier as a dialect renderer.
#[derive(Debug, Clone, Copy)]
pub struct MinifyRenderer(pub MinifyKind);

impl Render for MinifyRenderer {
    fn render(
        &self,
        _source: &Path,
        content: &str,
        _options: &RenderOptions,
    ) -> Result<String, CompileError> {
        match self.0 {
            MinifyKind::Css => minify_css(content),
            MinifyKind::Js => minify_js(content),
        }
    }
}
