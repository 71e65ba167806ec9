use std::collections::HashMap;

use super::error::RegistryError;
use super::processor::ProcessorDef;
use super::runner::Pipeline;

/// Name-indexed table of every processor the crate can run.
pub struct ProcessorRegistry {
    processors: HashMap<&'static str, ProcessorDef>,
}

impl ProcessorRegistry {
    pub fn new<I>(defs: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = ProcessorDef>,
    {
        let mut processors = HashMap::new();
        for def in defs {
            if processors.insert(def.name, def).is_some() {
                return Err(RegistryError::DuplicateProcessor(def.name.to_string()));
            }
        }
        Ok(Self { processors })
    }

    /// Registry holding the built-in processor library.
    pub fn standard() -> Result<Self, RegistryError> {
        Self::new(crate::processor::standard_processors())
    }

    pub fn get(&self, name: &str) -> Option<&ProcessorDef> {
        self.processors.get(name)
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Resolves `names` in order. Every unknown name is reported at once.
    pub fn build(&self, names: &[&str]) -> Result<Pipeline, RegistryError> {
        let mut defs = Vec::with_capacity(names.len());
        let mut missing = Vec::new();

        for name in names {
            match self.processors.get(name) {
                Some(def) => defs.push(*def),
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(RegistryError::UnresolvableProcessor { missing });
        }

        Ok(Pipeline::new(defs))
    }
}
