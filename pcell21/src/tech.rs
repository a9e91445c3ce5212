//!
//! # Technology Settings
//!
//! Units, the default optical [Trace], and port-labelling, loadable from JSON, YAML, or TOML.
//!
//! ```yaml
//! name: demo
//! optical_trace:
//!   width: 0.5
//!   bend_radius: 10.0
//! port_labels:
//!   layer: 10
//!   datatype: 0
//! ```
//!
//! Fields left out take their [Default] values.
//!

// Std-Lib
use std::path::Path;

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::{
    data::{Layer, Library, Units},
    import::Importer,
    trace::Trace,
    utils::SerdeFile,
    LayoutResult,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Technology {
    pub name: String,
    pub units: Units,
    /// Default template for routed links
    pub optical_trace: Trace,
    /// Layer for port labels in exported GDSII, if any
    pub port_labels: Option<Layer>,
}
impl Default for Technology {
    fn default() -> Self {
        Self {
            name: "default".into(),
            units: Units::default(),
            optical_trace: Trace::default(),
            port_labels: None,
        }
    }
}
impl SerdeFile for Technology {}
impl Technology {
    /// Load from file `fname`, in the format indicated by its extension, and validate
    pub fn from_file(fname: impl AsRef<Path>) -> LayoutResult<Self> {
        let tech = <Self as SerdeFile>::load(fname)?;
        tech.optical_trace.validate()?;
        Ok(tech)
    }
    /// Create an empty [Library] in our units and port-labelling
    pub fn library(&self, name: impl Into<String>) -> Library {
        Library {
            port_labels: self.port_labels,
            ..Library::new(name, self.units)
        }
    }
    /// Create an [Importer] into our units
    pub fn importer(&self) -> Importer {
        Importer::new(self.units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::SerializationFormat;
    use crate::LayoutError;

    #[test]
    fn test_file_round_trip() -> LayoutResult<()> {
        let tech = Technology {
            name: "tech".into(),
            optical_trace: Trace {
                width: 0.5,
                bend_radius: 10.,
                ..Default::default()
            },
            port_labels: Some(Layer::new(10, 0)),
            ..Default::default()
        };
        let dir = tempfile::tempdir()?;
        for (fmt, ext) in [
            (SerializationFormat::Json, "json"),
            (SerializationFormat::Yaml, "yaml"),
            (SerializationFormat::Toml, "toml"),
        ] {
            let path = dir.path().join(format!("tech.{}", ext));
            tech.save(fmt, &path)?;
            assert_eq!(Technology::from_file(&path)?, tech);
        }
        Ok(())
    }
    #[test]
    fn test_partial() -> LayoutResult<()> {
        let tech: Technology = SerializationFormat::Yaml.from_str(
            "
            optical_trace:
              width: 0.5
            ",
        )?;
        assert_eq!(tech.optical_trace.width, 0.5);
        assert_eq!(tech.optical_trace.bend_radius, 5.);
        assert_eq!(tech.units, Units::default());
        assert_eq!(tech.port_labels, None);

        let lib = Technology {
            port_labels: Some(Layer::new(10, 0)),
            ..tech
        }
        .library("lib");
        assert_eq!(lib.port_labels, Some(Layer::new(10, 0)));
        Ok(())
    }
    #[test]
    fn test_invalid_trace() -> LayoutResult<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("tech.json");
        std::fs::write(&path, r#"{"optical_trace": {"width": 2.0, "bend_radius": 0.5}}"#)?;
        assert!(matches!(
            Technology::from_file(&path),
            Err(LayoutError::InvalidTrace(_))
        ));
        Ok(())
    }
}
