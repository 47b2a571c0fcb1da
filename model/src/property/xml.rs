use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// An XML element annotation: qualified name plus attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlProperty {
    local_name: String,
    namespace_uri: String,
    attributes: BTreeMap<String, String>,
}

impl XmlProperty {
    /// Fails if `local_name` is empty. An empty namespace means none.
    pub fn new(local_name: impl Into<String>, namespace_uri: impl Into<String>) -> Result<Self> {
        let local_name = local_name.into();
        if local_name.is_empty() {
            return Err(Error::InvalidArgument("XML local name must not be empty".into()));
        }
        Ok(Self {
            local_name,
            namespace_uri: namespace_uri.into(),
            attributes: BTreeMap::new(),
        })
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn namespace_uri(&self) -> &str {
        &self.namespace_uri
    }

    /// Sets an attribute, returning the previous value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<Option<String>> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidArgument("XML attribute name must not be empty".into()));
        }
        Ok(self.attributes.insert(name, value.into()))
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes() {
        let mut xml = XmlProperty::new("h1", "http://www.daisy.org/z3986/2005/dtbook/").unwrap();
        assert_eq!(xml.set_attribute("id", "chapter-1").unwrap(), None);
        assert_eq!(
            xml.set_attribute("id", "ch1").unwrap(),
            Some("chapter-1".to_owned())
        );
        assert_eq!(xml.attribute("id"), Some("ch1"));
        assert_eq!(xml.remove_attribute("id"), Some("ch1".to_owned()));
        assert_eq!(xml.attributes().count(), 0);
    }

    #[test]
    fn empty_names_rejected() {
        assert!(XmlProperty::new("", "").is_err());
        let mut xml = XmlProperty::new("p", "").unwrap();
        assert!(xml.set_attribute("", "x").is_err());
    }
}
