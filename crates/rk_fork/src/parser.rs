//! Registration of decoders that turn raw resource data into typed objects.

use std::{
    any::Any,
    collections::HashMap,
    fmt::{self, Debug},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use tracing::debug;

use crate::{error::Result, types::TypeCode};

/// A decoded resource. Downcast with [`Arc::downcast`] to reach the concrete type.
pub type Object = Arc<dyn Any + Send + Sync>;

/// Something that can decode the data of one or more resource types.
pub trait ResourceParser: Send + Sync {
    /// Type codes this parser should be registered for
    fn type_codes(&self) -> Vec<TypeCode>;

    /// Whether this parser understands resources of `code`
    fn can_decode(&self, code: TypeCode) -> bool {
        self.type_codes().contains(&code)
    }

    /// Decode the raw data of a resource
    fn decode(&self, data: Vec<u8>) -> Result<Object>;
}

/// Parser used for any type without a registered decoder. The object is the raw `Vec<u8>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawDataParser;

impl ResourceParser for RawDataParser {
    fn type_codes(&self) -> Vec<TypeCode> {
        Vec::new()
    }

    fn can_decode(&self, _code: TypeCode) -> bool {
        true
    }

    fn decode(&self, data: Vec<u8>) -> Result<Object> {
        Ok(Arc::new(data))
    }
}

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(0);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Table from type code to parser, with [`RawDataParser`] as the default entry.
///
/// Every registry, clone and modification gets a new generation. Cached objects remember the
/// generation that decoded them, so a different registry never sees them.
pub struct ParserRegistry {
    parsers: HashMap<TypeCode, Arc<dyn ResourceParser>>,
    fallback: Arc<dyn ResourceParser>,
    generation: u64,
}

impl Clone for ParserRegistry {
    fn clone(&self) -> Self {
        Self {
            parsers: self.parsers.clone(),
            fallback: self.fallback.clone(),
            generation: next_generation(),
        }
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("types", &self.parsers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ParserRegistry {
    /// A registry that only knows the raw data fallback
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
            fallback: Arc::new(RawDataParser),
            generation: next_generation(),
        }
    }

    /// Identifies this registry and its current set of parsers
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Build a registry from every parser available at startup
    pub fn with_parsers<I>(parsers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn ResourceParser>>,
    {
        let mut registry = Self::new();
        for parser in parsers {
            registry.register(parser);
        }
        registry
    }

    /// Bind a parser to each of the type codes it declares.
    ///
    /// A later registration for the same type replaces the earlier one.
    pub fn register(&mut self, parser: Arc<dyn ResourceParser>) {
        for code in parser.type_codes() {
            if parser.can_decode(code) {
                self.register_for(code, parser.clone());
            }
        }
    }

    /// Bind a parser to a single type code
    pub fn register_for(&mut self, code: TypeCode, parser: Arc<dyn ResourceParser>) {
        debug!(%code, "registering resource parser");
        self.parsers.insert(code, parser);
        self.generation = next_generation();
    }

    /// Replace the parser used for types without a registration
    pub fn set_fallback(&mut self, parser: Arc<dyn ResourceParser>) {
        self.fallback = parser;
        self.generation = next_generation();
    }

    /// Whether a dedicated parser is registered for `code`
    pub fn has_parser(&self, code: TypeCode) -> bool {
        self.parsers.contains_key(&code)
    }

    /// The parser that will be used for `code`
    pub fn parser_for(&self, code: TypeCode) -> &Arc<dyn ResourceParser> {
        self.parsers.get(&code).unwrap_or(&self.fallback)
    }

    /// Decode `data` with the parser for `code`
    pub fn decode(&self, code: TypeCode, data: Vec<u8>) -> Result<Object> {
        self.parser_for(code).decode(data)
    }
}
