use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const MINECRAFT_NAMESPACE: &str = "minecraft";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceLocationError {
    #[error("empty resource location")]
    Empty,
    #[error("invalid character {character:?} in namespace of {input:?}")]
    InvalidNamespace { input: String, character: char },
    #[error("invalid character {character:?} in path of {input:?}")]
    InvalidPath { input: String, character: char },
}

/// A namespaced identifier such as `minecraft:story/root`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceLocation {
    pub namespace: String,
    pub path: String,
}

impl ResourceLocation {
    #[must_use]
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    /// Creates a location in the `minecraft` namespace.
    #[must_use]
    pub fn vanilla(path: impl Into<String>) -> Self {
        Self::new(MINECRAFT_NAMESPACE, path)
    }

    /// Parses `namespace:path`, defaulting the namespace to `minecraft`.
    pub fn parse(input: &str) -> Result<Self, ResourceLocationError> {
        if input.is_empty() {
            return Err(ResourceLocationError::Empty);
        }
        let (namespace, path) = input
            .split_once(':')
            .unwrap_or((MINECRAFT_NAMESPACE, input));
        let namespace = if namespace.is_empty() {
            MINECRAFT_NAMESPACE
        } else {
            namespace
        };

        if let Some(character) = namespace.chars().find(|c| !is_namespace_char(*c)) {
            return Err(ResourceLocationError::InvalidNamespace {
                input: input.to_string(),
                character,
            });
        }
        if path.is_empty() {
            return Err(ResourceLocationError::Empty);
        }
        if let Some(character) = path.chars().find(|c| !is_path_char(*c)) {
            return Err(ResourceLocationError::InvalidPath {
                input: input.to_string(),
                character,
            });
        }
        Ok(Self::new(namespace, path))
    }

    #[must_use]
    pub fn is_vanilla(&self) -> bool {
        self.namespace == MINECRAFT_NAMESPACE
    }
}

const fn is_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.')
}

const fn is_path_char(c: char) -> bool {
    is_namespace_char(c) || c == '/'
}

/// Lenient conversion used for data that was already validated elsewhere.
impl From<&str> for ResourceLocation {
    fn from(value: &str) -> Self {
        match value.split_once(':') {
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::vanilla(value),
        }
    }
}

impl From<&String> for ResourceLocation {
    fn from(value: &String) -> Self {
        Self::from(value.as_str())
    }
}

impl FromStr for ResourceLocation {
    type Err = ResourceLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for ResourceLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl Serialize for ResourceLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ResourceLocationVisitor;

        impl Visitor<'_> for ResourceLocationVisitor {
            type Value = ResourceLocation;

            fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
                formatter.write_str("a resource location")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                ResourceLocation::parse(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(ResourceLocationVisitor)
    }
}
