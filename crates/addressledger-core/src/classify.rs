//! Result-code classification.
//!
//! The provider describes each verified address with a comma-delimited list
//! of short result codes. This module turns that list into a deliverable /
//! not-deliverable verdict.
//!
//! # Rules
//!
//! 1. Any code starting with the error prefix (`AE`) is an error code.
//! 2. Any unconditional-good code (`AV21`..`AV25`) makes the address good,
//!    whatever else is in the list.
//! 3. A conditional-good code (`AV14`) makes the address good only if the
//!    whole list carries no error code.
//! 4. When PO boxes are blocked and the provider marked the address as a
//!    PO box, the verdict is forced to bad and `AEPOBOX` is appended to the
//!    stored codes.
//!
//! Unrecognized codes are ignored; a list with no recognized code is bad.
//!
//! # Example
//!
//! ```
//! use addressledger_core::classify::{CodeRules, classify};
//!
//! let verdict = classify("AC01,AV14", None, true);
//! assert!(verdict.good);
//!
//! let verdict = CodeRules::MELISSA.classify("AV25", Some("P"), true);
//! assert!(!verdict.good);
//! assert_eq!(verdict.codes, "AV25,AEPOBOX");
//! ```

/// Fixed code vocabulary the classifier works against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeRules<'a> {
    /// Codes that mark an address deliverable on their own.
    pub good: &'a [&'a str],
    /// Codes that mark an address deliverable only when no error code is present.
    pub good_if_no_error: &'a [&'a str],
    /// Prefix shared by all error codes.
    pub error_prefix: &'a str,
    /// Address-type value identifying a PO box.
    pub po_box_type: &'a str,
    /// Synthetic code appended when a PO box is rejected.
    pub po_box_rejection: &'a str,
}

impl CodeRules<'static> {
    /// Melissa Global Address vocabulary.
    pub const MELISSA: Self = Self {
        good: &["AV25", "AV24", "AV23", "AV22", "AV21"],
        // AV14 cannot be verified at the highest resolution, but mail-drop
        // locations (Mail Boxes Etc and similar) land here and are deliverable.
        good_if_no_error: &["AV14"],
        error_prefix: "AE",
        po_box_type: addressledger_melissa::PO_BOX_ADDRESS_TYPE,
        po_box_rejection: "AEPOBOX",
    };
}

impl Default for CodeRules<'static> {
    fn default() -> Self {
        Self::MELISSA
    }
}

/// Outcome of classifying one provider result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the address is deliverable.
    pub good: bool,
    /// Code string to store, including any synthetic rejection code.
    pub codes: String,
}

impl<'a> CodeRules<'a> {
    /// Returns true if `code` is an error code.
    #[must_use]
    pub fn is_error_code(&self, code: &str) -> bool {
        code.starts_with(self.error_prefix)
    }

    /// Classifies a comma-delimited code list.
    ///
    /// `address_type` is the provider's address-type indicator, if it sent one.
    #[must_use]
    pub fn classify(
        &self,
        codes: &str,
        address_type: Option<&str>,
        block_po_boxes: bool,
    ) -> Verdict {
        let mut errors_present = false;
        let mut good = false;
        let mut good_conditional = false;

        // Error detection scans the full list even after a good code is seen
        for code in split_codes(codes) {
            if self.is_error_code(code) {
                errors_present = true;
            }
            if self.good_if_no_error.contains(&code) {
                good_conditional = true;
            }
            if self.good.contains(&code) {
                good = true;
            }
        }

        if good_conditional && !errors_present {
            good = true;
        }

        let mut codes = codes.to_string();
        if block_po_boxes && address_type == Some(self.po_box_type) {
            good = false;
            if !codes.is_empty() {
                codes.push(',');
            }
            codes.push_str(self.po_box_rejection);
        }

        Verdict { good, codes }
    }
}

impl Verdict {
    /// Returns the error codes in the stored code string.
    #[must_use]
    pub fn error_codes<'s>(&'s self, rules: &CodeRules<'_>) -> Vec<&'s str> {
        split_codes(&self.codes)
            .filter(|code| rules.is_error_code(code))
            .collect()
    }
}

/// Classifies with the built-in Melissa vocabulary.
#[must_use]
pub fn classify(codes: &str, address_type: Option<&str>, block_po_boxes: bool) -> Verdict {
    CodeRules::MELISSA.classify(codes, address_type, block_po_boxes)
}

fn split_codes(codes: &str) -> impl Iterator<Item = &str> {
    codes.split(',').map(str::trim).filter(|code| !code.is_empty())
}
