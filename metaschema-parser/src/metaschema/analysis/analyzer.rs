//! Analyzer context

use super::lowering;
use crate::metaschema::asg;
use crate::metaschema::ast;
use crate::metaschema::diagnostics::Diagnostic;
use indexmap::IndexMap;

/// Holds the document being processed and the diagnostics of every document seen so far.
#[derive(Debug, Default)]
pub struct Analyzer {
    diagnostics: IndexMap<String, Vec<Diagnostic>>,
    current_document_uri: Option<String>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets all documents and diagnostics.
    pub fn clear(&mut self) {
        self.diagnostics.clear();
        self.current_document_uri = None;
    }

    /// Selects the document diagnostics are reported against. [`Analyzer::lower`] and
    /// [`Analyzer::add_document`] set it themselves; this is for batching and tests.
    pub fn set_current_document_uri(&mut self, uri: Option<&str>) {
        self.current_document_uri = uri.map(str::to_string);
    }

    pub fn current_document_uri(&self) -> Option<&str> {
        self.current_document_uri.as_deref()
    }

    /// Replaces the diagnostics of `uri` and lowers the document.
    pub fn add_document(&mut self, uri: &str, document: &ast::Document) -> asg::Document {
        self.diagnostics.insert(uri.to_string(), Vec::new());
        self.lower(uri, document)
    }

    /// Lowers a parsed document, appending to the diagnostics `uri` already has.
    pub fn lower(&mut self, uri: &str, document: &ast::Document) -> asg::Document {
        self.set_current_document_uri(Some(uri));
        lowering::lower_document(self, uri, document)
    }

    /// Records a diagnostic for the current document.
    ///
    /// # Panics
    ///
    /// When no document is being processed.
    pub fn add_error(&mut self, diagnostic: Diagnostic) {
        let Some(uri) = self.current_document_uri.as_ref() else {
            panic!("Cannot call add_error outside document processing.");
        };
        tracing::debug!(%uri, code = %diagnostic.name, message = %diagnostic.message, "analysis diagnostic");
        self.diagnostics
            .entry(uri.clone())
            .or_default()
            .push(diagnostic);
    }

    pub fn document_diagnostics(&self, uri: &str) -> &[Diagnostic] {
        self.diagnostics.get(uri).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Diagnostics of the current document, empty when there is none.
    pub fn current_document_diagnostics(&self) -> &[Diagnostic] {
        match self.current_document_uri() {
            Some(uri) => self.document_diagnostics(uri),
            None => &[],
        }
    }

    pub fn all_diagnostics(&self) -> &IndexMap<String, Vec<Diagnostic>> {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metaschema::ast::Range;
    use crate::metaschema::diagnostics::ErrorCode;
    use crate::metaschema::parsing::parse;

    fn error(message: &str) -> Diagnostic {
        Diagnostic::error(Range::default(), ErrorCode::DuplicateIdentifier, message)
    }

    #[test]
    #[should_panic(expected = "outside document processing")]
    fn test_add_error_without_document_panics() {
        let mut analyzer = Analyzer::new();
        analyzer.add_error(error("boom"));
    }

    #[test]
    fn test_errors_are_kept_per_document() {
        let mut analyzer = Analyzer::new();
        analyzer.set_current_document_uri(Some("a"));
        analyzer.add_error(error("first"));
        analyzer.set_current_document_uri(Some("b"));
        analyzer.add_error(error("second"));
        analyzer.add_error(error("third"));

        assert_eq!(analyzer.document_diagnostics("a").len(), 1);
        assert_eq!(analyzer.current_document_diagnostics().len(), 2);
        assert!(analyzer.document_diagnostics("c").is_empty());
        assert_eq!(analyzer.all_diagnostics().len(), 2);

        analyzer.clear();
        assert!(analyzer.all_diagnostics().is_empty());
        assert!(analyzer.current_document_uri().is_none());
    }

    #[test]
    fn test_add_document_replaces_previous_diagnostics() {
        let source = "schema S () {\n\tlet v = 1;\n\tlet v = 2;\n}";
        let parsed = parse("doc", source);
        let mut analyzer = Analyzer::new();

        analyzer.add_document("doc", &parsed.document);
        assert_eq!(analyzer.document_diagnostics("doc").len(), 2);

        analyzer.add_document("doc", &parsed.document);
        assert_eq!(analyzer.document_diagnostics("doc").len(), 2);

        analyzer.lower("doc", &parsed.document);
        assert_eq!(analyzer.document_diagnostics("doc").len(), 4);
        assert_eq!(analyzer.current_document_uri(), Some("doc"));
    }
}
