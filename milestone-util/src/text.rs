use serde::de::{Error, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};

/// The content of a single text component.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextContent {
    Text(String),
    Translate {
        key: String,
        with: Vec<TextComponent>,
    },
}

/// Represents a text component, the JSON chat format used for titles and
/// descriptions. Styling is not kept.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextComponent {
    pub content: TextContent,
    pub extra: Vec<TextComponent>,
}

impl TextComponent {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: TextContent::Text(text.into()),
            extra: Vec::new(),
        }
    }

    #[must_use]
    pub fn translate(key: impl Into<String>, with: impl Into<Vec<Self>>) -> Self {
        Self {
            content: TextContent::Translate {
                key: key.into(),
                with: with.into(),
            },
            extra: Vec::new(),
        }
    }

    #[must_use]
    pub fn add_child(mut self, child: Self) -> Self {
        self.extra.push(child);
        self
    }

    /// Renders the component without a translation table: translatable
    /// parts print their key followed by their arguments.
    #[must_use]
    pub fn to_plain(&self) -> String {
        let mut out = String::new();
        self.write_plain(&mut out);
        out
    }

    fn write_plain(&self, out: &mut String) {
        match &self.content {
            TextContent::Text(text) => out.push_str(text),
            TextContent::Translate { key, with } => {
                out.push_str(key);
                if !with.is_empty() {
                    let args: Vec<String> = with.iter().map(Self::to_plain).collect();
                    out.push('(');
                    out.push_str(&args.join(", "));
                    out.push(')');
                }
            }
        }
        for child in &self.extra {
            child.write_plain(out);
        }
    }
}

impl Display for TextComponent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_plain())
    }
}

impl Serialize for TextComponent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match &self.content {
            TextContent::Text(text) => map.serialize_entry("text", text)?,
            TextContent::Translate { key, with } => {
                map.serialize_entry("translate", key)?;
                if !with.is_empty() {
                    map.serialize_entry("with", with)?;
                }
            }
        }
        if !self.extra.is_empty() {
            map.serialize_entry("extra", &self.extra)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TextComponent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TextComponentVisitor;

        impl<'de> Visitor<'de> for TextComponentVisitor {
            type Value = TextComponent;

            fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
                formatter.write_str("a string, a text component or a sequence of text components")
            }

            fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(TextComponent::text(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut base = seq
                    .next_element::<TextComponent>()?
                    .ok_or_else(|| A::Error::invalid_length(0, &self))?;
                while let Some(element) = seq.next_element::<TextComponent>()? {
                    base.extra.push(element);
                }
                Ok(base)
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut text = None;
                let mut translate = None;
                let mut with = Vec::new();
                let mut extra = Vec::new();

                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "text" => text = Some(map.next_value::<String>()?),
                        "translate" => translate = Some(map.next_value::<String>()?),
                        "with" => with = map.next_value()?,
                        "extra" => extra = map.next_value()?,
                        // colours, fonts, click and hover events
                        _ => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }

                let content = match (translate, text) {
                    (Some(key), _) => TextContent::Translate { key, with },
                    (None, Some(text)) => TextContent::Text(text),
                    (None, None) => return Err(A::Error::missing_field("text")),
                };
                Ok(TextComponent { content, extra })
            }
        }

        deserializer.deserialize_any(TextComponentVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_plain_string() {
        let component: TextComponent = serde_json::from_str("\"Got dirt!\"").unwrap();
        assert_eq!(component, TextComponent::text("Got dirt!"));
    }

    #[test]
    fn deserialize_translate_ignores_style() {
        let component: TextComponent = serde_json::from_str(
            r#"{"translate": "advancements.story.root.title", "color": "green", "bold": true}"#,
        )
        .unwrap();
        assert_eq!(
            component,
            TextComponent::translate("advancements.story.root.title", Vec::new())
        );
    }

    #[test]
    fn deserialize_sequence_appends_extras() {
        let component: TextComponent =
            serde_json::from_str(r#"["Open ", {"text": "chests"}]"#).unwrap();
        assert_eq!(component.to_plain(), "Open chests");
        assert_eq!(component.extra.len(), 1);
    }

    #[test]
    fn serialize_round_trips_translation_arguments() {
        let component = TextComponent::translate(
            "chat.type.advancement.task",
            vec![TextComponent::text("Steve")],
        );
        let json = serde_json::to_value(&component).unwrap();
        assert_eq!(json["translate"], "chat.type.advancement.task");
        assert_eq!(json["with"][0]["text"], "Steve");
    }
}
