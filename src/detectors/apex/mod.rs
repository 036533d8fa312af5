//! Apex class and trigger detectors (150-point rubric).

pub mod bulkification;
pub mod documentation;
pub mod error_handling;
pub mod naming;
pub mod security;

use std::sync::LazyLock;

use regex::Regex;

use crate::detectors::Detector;

// Class declaration with optional annotation and modifiers; group 1 is the name.
pub(crate) static RE_CLASS_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:@\w+(?:\([^)]*\))?\s+)*(?:(?:public|private|protected|global|virtual|abstract|static|(?:with|without|inherited)\s+sharing)\s+)*class\s+(\w+)",
    )
    .unwrap()
});

// Method declaration with an access modifier; group 1 is the modifier,
// group 2 the method name.
pub(crate) static RE_METHOD_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(public|private|protected|global)\s+(?:(?:static|virtual|override|abstract|final|testmethod|webservice)\s+)*[\w.]+(?:\s*<[^()]*?>)?(?:\[\])?\s+(\w+)\s*\(",
    )
    .unwrap()
});

pub fn detectors() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(bulkification::BulkificationDetector),
        Box::new(security::SecurityDetector),
        Box::new(naming::NamingDetector),
        Box::new(error_handling::ErrorHandlingDetector),
        Box::new(documentation::DocumentationDetector),
    ]
}
