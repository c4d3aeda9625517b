//! Structure metadata: concept discovery and code resolution.
//!
//! Built once from a parsed [`StructureDocument`], then read-only. The
//! model owns three derived lookups: concept code → name (both
//! directions), concept code → codelist key, and concept code → coded
//! value → description. One concept is the *primary measure* (the
//! observed value itself, usually `OBS_VALUE`); resolving a value for it
//! is an identity passthrough rather than a codelist lookup.
//!
//! ## Structure document layout
//!
//! The parts of the document the model reads:
//!
//! 1. A `PrimaryMeasure` element whose `conceptRef` names the measure
//!    concept.
//! 2. The `KeyFamily` subtree, whose `conceptRef`-bearing descendants
//!    enumerate the concepts composing the dataset's dimensionality. A
//!    `codelist` attribute on such an element keys the concept's
//!    enumeration.
//! 3. `Concept` elements (matched by `id`) carrying a `Name` child.
//! 4. `CodeList` elements (matched by `id`) with `Code` children, each
//!    carrying a `value` attribute and a `Description` child.
//!
//! A concept may legitimately declare a codelist key that resolves to no
//! `CodeList` element; such a concept simply has no enumeration. That
//! absence is distinct from a `CodeList` present with zero `Code`
//! children.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SdmxError};
use crate::structure::{Element, StructureDocument};

/// Mapping from coded value to description for one concept.
pub type CodeLevels = BTreeMap<String, String>;

/// One variable of the dataset, as declared by the key family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    /// Stable identifier used as a column header in coded data files
    /// (e.g. `"SEX"`).
    pub code: String,

    /// Human-readable label (e.g. `"Sex"`).
    pub name: String,

    /// Key of the concept's codelist (e.g. `"CL_SEX"`), when it declares
    /// one. The primary measure never does.
    pub codelist_key: Option<String>,
}

/// Code-resolution model derived from a structure document.
#[derive(Debug, Clone)]
pub struct StructureMetadata {
    primary_measure_code: String,
    concepts: Vec<Concept>,
    code_to_name: BTreeMap<String, String>,
    name_to_code: BTreeMap<String, String>,
    code_levels: BTreeMap<String, CodeLevels>,
}

impl StructureMetadata {
    /// Load a structure document from disk and build the model from it.
    pub fn from_path(path: &Path) -> Result<Self> {
        let document = StructureDocument::from_path(path)?;
        Self::from_document(&document)
    }

    /// Build the model from an already parsed document.
    ///
    /// Either completes fully or fails; a returned error never leaves a
    /// partially queryable model behind.
    pub fn from_document(document: &StructureDocument) -> Result<Self> {
        let root = document.root();
        let primary_measure_code = find_primary_measure(root)?;
        let concepts = collect_concepts(root)?;
        let code_levels = collect_code_levels(root, &concepts);

        let mut code_to_name = BTreeMap::new();
        let mut name_to_code = BTreeMap::new();
        for concept in &concepts {
            code_to_name.insert(concept.code.clone(), concept.name.clone());
            // Display names are not required to be unique; the last
            // binding wins for the reverse lookup.
            name_to_code.insert(concept.name.clone(), concept.code.clone());
        }

        Ok(Self {
            primary_measure_code,
            concepts,
            code_to_name,
            name_to_code,
            code_levels,
        })
    }

    /// Concepts in key-family order.
    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    /// Concept code of the primary measure.
    pub fn primary_measure_code(&self) -> &str {
        &self.primary_measure_code
    }

    /// Is this the primary measure code?
    pub fn is_primary_measure(&self, code: &str) -> bool {
        code == self.primary_measure_code
    }

    /// Display name for a concept code.
    pub fn name_by_code(&self, code: &str) -> Result<&str> {
        self.code_to_name
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| SdmxError::UnknownConceptCode {
                code: code.to_string(),
            })
    }

    /// Concept code for a display name.
    pub fn code_by_name(&self, name: &str) -> Result<&str> {
        self.name_to_code
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| SdmxError::UnknownConceptName {
                name: name.to_string(),
            })
    }

    /// Full snapshot of all enumerations, keyed by concept code.
    pub fn code_levels(&self) -> &BTreeMap<String, CodeLevels> {
        &self.code_levels
    }

    /// Enumeration of one concept.
    ///
    /// `Ok(None)` for the primary measure (by definition not enumerated)
    /// and for a concept without a resolvable codelist; `Ok(Some(..))`
    /// otherwise, possibly empty. Errors only when `code` was never
    /// discovered at all.
    pub fn code_levels_by_code(&self, code: &str) -> Result<Option<&CodeLevels>> {
        if !self.code_to_name.contains_key(code) {
            return Err(SdmxError::UnknownConceptCode {
                code: code.to_string(),
            });
        }
        if self.is_primary_measure(code) {
            return Ok(None);
        }
        Ok(self.code_levels.get(code))
    }

    /// Resolve one coded value to its description.
    ///
    /// An empty value passes through unchanged (a missing observation,
    /// not an error), and so does any value of the primary measure (the
    /// value already is the description). `trim` strips the surrounding
    /// whitespace some descriptions carry as presentation indentation.
    pub fn description_by_code_level(&self, code: &str, value: &str, trim: bool) -> Result<String> {
        if value.is_empty() {
            return Ok(String::new());
        }
        if self.is_primary_measure(code) {
            return Ok(value.to_string());
        }
        if !self.code_to_name.contains_key(code) {
            return Err(SdmxError::UnknownConceptCode {
                code: code.to_string(),
            });
        }
        let description = self
            .code_levels
            .get(code)
            .and_then(|levels| levels.get(value))
            .ok_or_else(|| SdmxError::UnknownCodeValue {
                code: code.to_string(),
                value: value.to_string(),
            })?;
        if trim {
            Ok(description.trim().to_string())
        } else {
            Ok(description.clone())
        }
    }
}

/// Locate the primary measure and return its concept reference.
fn find_primary_measure(root: &Element) -> Result<String> {
    root.find("PrimaryMeasure")
        .and_then(|e| e.attr("conceptRef"))
        .map(str::to_string)
        .ok_or(SdmxError::PrimaryMeasureMissing)
}

/// Scan the key family for concept references, then resolve each to its
/// `Concept` definition for the display name.
fn collect_concepts(root: &Element) -> Result<Vec<Concept>> {
    // A document without a key family declares no dimensionality; it
    // yields zero concepts rather than an error.
    let Some(key_family) = root.find("KeyFamily") else {
        return Ok(Vec::new());
    };

    let mut concepts = Vec::new();
    for element in key_family.iter() {
        let Some(code) = element.attr("conceptRef") else {
            continue;
        };
        if concepts.iter().any(|c: &Concept| c.code == code) {
            return Err(SdmxError::DuplicateConceptCode {
                code: code.to_string(),
            });
        }
        concepts.push(Concept {
            code: code.to_string(),
            name: String::new(),
            codelist_key: element.attr("codelist").map(str::to_string),
        });
    }

    for concept in &mut concepts {
        let definition = root
            .iter()
            .find(|e| e.tag == "Concept" && e.attr("id") == Some(concept.code.as_str()))
            .ok_or_else(|| SdmxError::ConceptDefinitionMissing {
                code: concept.code.clone(),
            })?;
        let name = definition
            .child("Name")
            .ok_or_else(|| SdmxError::ConceptNameMissing {
                code: concept.code.clone(),
            })?;
        concept.name = name.text().to_string();
    }

    Ok(concepts)
}

/// Resolve each concept's codelist key to its `CodeList` definition and
/// extract the coded value → description pairs. A key with no matching
/// `CodeList` yields no entry (an observed legitimate case, not an
/// error).
fn collect_code_levels(root: &Element, concepts: &[Concept]) -> BTreeMap<String, CodeLevels> {
    let mut code_levels = BTreeMap::new();
    for concept in concepts {
        let Some(key) = concept.codelist_key.as_deref() else {
            continue;
        };
        let Some(code_list) = root
            .iter()
            .find(|e| e.tag == "CodeList" && e.attr("id") == Some(key))
        else {
            continue;
        };
        let mut levels = CodeLevels::new();
        for code in code_list.children.iter().filter(|c| c.tag == "Code") {
            let Some(value) = code.attr("value") else {
                continue;
            };
            let description = code.child("Description").map(Element::text).unwrap_or("");
            levels.insert(value.to_string(), description.to_string());
        }
        code_levels.insert(concept.code.clone(), levels);
    }
    code_levels
}
