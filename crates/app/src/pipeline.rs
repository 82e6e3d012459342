use ledgerline_core::{Money, Suggestion, TransactionRecord};
use ledgerline_import::{detect_statement_date, Assembler, AssemblyReport, SuggestionMatcher};
use ledgerline_ocr::{DocumentSource, ExtractionFailure, TextRecognizer, TextSourceSelector};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;

use crate::config::Settings;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extraction(#[from] ExtractionFailure),
    #[error("Extraction task for '{document}' failed: {source}")]
    Task {
        document: String,
        #[source]
        source: tokio::task::JoinError,
    },
    #[error("Processing of '{document}' was aborted")]
    Aborted { document: String },
}

/// A transaction with the best learned suggestion for it, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedTransaction {
    #[serde(flatten)]
    pub record: TransactionRecord,
    pub suggestion: Option<Suggestion>,
}

/// Everything extracted from one statement.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedStatement {
    pub document: String,
    pub ocr_used: bool,
    pub statement_date: Option<String>,
    pub transactions: Vec<EnrichedTransaction>,
    pub total_amount: Money,
    pub report: AssemblyReport,
}

/// Orchestrates: text source selection → assembly → suggestion lookup.
///
/// Each document is handled strictly in line order. Extraction (which may
/// run OCR for seconds per page) happens on the blocking pool and never
/// under the pattern store lock.
pub struct StatementPipeline<R: TextRecognizer + 'static> {
    selector: Arc<TextSourceSelector<R>>,
    assembler: Arc<Assembler>,
    matcher: Option<SuggestionMatcher>,
}

impl<R: TextRecognizer + 'static> Clone for StatementPipeline<R> {
    fn clone(&self) -> Self {
        Self {
            selector: Arc::clone(&self.selector),
            assembler: Arc::clone(&self.assembler),
            matcher: self.matcher.clone(),
        }
    }
}

impl<R: TextRecognizer + 'static> StatementPipeline<R> {
    pub fn new(selector: TextSourceSelector<R>, assembler: Assembler) -> Self {
        Self {
            selector: Arc::new(selector),
            assembler: Arc::new(assembler),
            matcher: None,
        }
    }

    pub fn from_settings(recognizer: R, settings: &Settings) -> Self {
        Self::new(
            TextSourceSelector::with_config(recognizer, settings.selector.clone()),
            Assembler::new(settings.assembler.clone()),
        )
    }

    /// Attach suggestions from `matcher` to every assembled transaction.
    pub fn with_matcher(mut self, matcher: SuggestionMatcher) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub async fn process<D>(&self, document: D, force_ocr: bool) -> Result<ProcessedStatement, PipelineError>
    where
        D: DocumentSource + 'static,
    {
        let name = document.name().to_string();
        let selector = Arc::clone(&self.selector);
        let extracted = tokio::task::spawn_blocking(move || selector.extract(&document, force_ocr))
            .await
            .map_err(|source| PipelineError::Task {
                document: name.clone(),
                source,
            })??;

        let statement_date = detect_statement_date(&extracted.lines);
        let assembly = self.assembler.assemble(&extracted.lines);
        let total_amount = assembly.total_amount();

        let transactions = assembly
            .transactions
            .into_iter()
            .map(|record| {
                let suggestion = self
                    .matcher
                    .as_ref()
                    .and_then(|m| m.suggest(&record.description, record.reference.as_deref()));
                EnrichedTransaction { record, suggestion }
            })
            .collect::<Vec<_>>();

        tracing::info!(
            document = %name,
            ocr_used = extracted.ocr_used,
            transactions = transactions.len(),
            skipped = assembly.report.skipped.len(),
            "statement processed"
        );

        Ok(ProcessedStatement {
            document: name,
            ocr_used: extracted.ocr_used,
            statement_date,
            transactions,
            total_amount,
            report: assembly.report,
        })
    }

    /// Process documents concurrently. Results come back in input order; one
    /// document failing does not affect the others.
    pub async fn process_many<D>(
        &self,
        documents: Vec<D>,
        force_ocr: bool,
    ) -> Vec<Result<ProcessedStatement, PipelineError>>
    where
        D: DocumentSource + 'static,
    {
        let names: Vec<String> = documents.iter().map(|d| d.name().to_string()).collect();
        let mut set = JoinSet::new();
        for (idx, document) in documents.into_iter().enumerate() {
            let pipeline = self.clone();
            set.spawn(async move { (idx, pipeline.process(document, force_ocr).await) });
        }

        let mut results: Vec<Option<Result<ProcessedStatement, PipelineError>>> =
            names.iter().map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, result)) => results[idx] = Some(result),
                Err(e) => tracing::warn!(error = %e, "statement task did not complete"),
            }
        }

        results
            .into_iter()
            .zip(names)
            .map(|(result, document)| result.unwrap_or(Err(PipelineError::Aborted { document })))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
    use ledgerline_import::{PatternLearner, PatternStore, SkipReason};
    use ledgerline_ocr::{InMemoryDocument, MockRecognizer, SourceError, UnavailableRecognizer};
    use std::io::Cursor;

    const STATEMENT: &str = "\
Statement date: 30/06/23
Post Date Trans Date Description Reference Fees Amount Balance
07/06/23 07/06/23 ** MTN May 2023 A0159924 -121.00 +114216.50
08/06/23 08/06/23 Outward EFT MTN To 4063304150 632006 -500.00 +113716.50
  June";

    fn tiny_png() -> Vec<u8> {
        let img: GrayImage = ImageBuffer::from_fn(4, 4, |_, _| Luma([200u8]));
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn text_only_pipeline() -> StatementPipeline<UnavailableRecognizer> {
        StatementPipeline::from_settings(UnavailableRecognizer, &Settings::default())
    }

    #[tokio::test]
    async fn text_layer_statement() {
        let doc = InMemoryDocument::new("june.pdf").with_text(STATEMENT);
        let out = text_only_pipeline().process(doc, false).await.unwrap();

        assert_eq!(out.document, "june.pdf");
        assert!(!out.ocr_used);
        assert_eq!(out.statement_date.as_deref(), Some("30/06/23"));
        assert_eq!(out.transactions.len(), 2);
        assert_eq!(out.transactions[1].record.description, "Outward EFT MTN To 632006 June");
        assert!(out.transactions.iter().all(|t| t.suggestion.is_none()));
        assert_eq!(out.total_amount, Money::from_cents(-62_100));
        assert_eq!(out.report.skipped_for(SkipReason::BeforeFirstTransaction), 2);
        assert!(out.report.balance_mismatches.is_empty());
    }

    #[tokio::test]
    async fn garbled_text_layer_falls_back_to_ocr() {
        let recognizer = Arc::new(MockRecognizer::new(STATEMENT));
        let pipeline = StatementPipeline::from_settings(Arc::clone(&recognizer), &Settings::default());
        let doc = InMemoryDocument::new("scan.pdf")
            .with_text("'⁄⁄–‚fl•?m–M POTPRWXVSV")
            .with_page_image(tiny_png());

        let out = pipeline.process(doc, false).await.unwrap();
        assert!(out.ocr_used);
        assert_eq!(recognizer.calls(), 1);
        assert_eq!(out.transactions.len(), 2);
    }

    #[tokio::test]
    async fn unreadable_document_is_an_extraction_failure() {
        let doc = InMemoryDocument::new("locked.pdf").with_text_error(SourceError::Encrypted);
        let err = text_only_pipeline().process(doc, false).await.unwrap_err();
        match err {
            PipelineError::Extraction(f) => assert_eq!(f.document, "locked.pdf"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn learned_patterns_enrich_transactions() {
        let store = Arc::new(PatternStore::new());
        PatternLearner::new(Arc::clone(&store))
            .learn(
                "Outward EFT MTN To 4063304150 632005",
                "Mobile - MTN Monthly",
                None,
                None,
            )
            .unwrap();
        let pipeline = text_only_pipeline().with_matcher(SuggestionMatcher::new(store));

        let doc = InMemoryDocument::new("june.pdf").with_text(STATEMENT);
        let out = pipeline.process(doc, false).await.unwrap();
        assert!(out.transactions[0].suggestion.is_none());
        let s = out.transactions[1].suggestion.as_ref().unwrap();
        assert_eq!(s.suggested_description, "Mobile - MTN Monthly");
        assert_eq!(s.confidence, 0.7);
    }

    #[tokio::test]
    async fn many_documents_keep_input_order() {
        let docs = vec![
            InMemoryDocument::new("a.pdf").with_text(STATEMENT),
            InMemoryDocument::new("b.pdf").with_text_error(SourceError::NoTextLayer),
            InMemoryDocument::new("c.pdf").with_text("07/06/23 07/06/23 Fee -5.00 95.00"),
        ];
        let results = text_only_pipeline().process_many(docs, false).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().transactions.len(), 2);
        assert!(matches!(&results[1], Err(PipelineError::Extraction(f)) if f.document == "b.pdf"));
        assert_eq!(results[2].as_ref().unwrap().document, "c.pdf");
    }

    #[test]
    fn processed_statement_serializes_flat_records() {
        let tx = EnrichedTransaction {
            record: ledgerline_import::assemble(&["07/06/23 07/06/23 ** MTN May 2023 A0159924 -121.00 +114216.50"])
                .remove(0),
            suggestion: None,
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["reference"], "A0159924");
        assert_eq!(json["post_date"], "07/06/23");
        assert!(json["suggestion"].is_null());
    }
}
