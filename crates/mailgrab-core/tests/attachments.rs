//! End-to-end tests for attachment indexing and extraction.
//!
//! These tests use an in-memory mail source to simulate a selected IMAP
//! folder without requiring a real server connection.

use std::collections::HashMap;
use std::sync::Once;

use mailgrab_core::{
    AttachmentLocator, AttachmentPolicy, AttachmentService, Error, IndexConfig, MailSource,
};
use mailgrab_imap::{MessageId, MessageIdSet, WireResult};

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[derive(Debug, thiserror::Error)]
enum MockError {
    #[error("no such message: {0}")]
    NoSuchMessage(MessageId),
    #[error("connection reset")]
    ConnectionReset,
}

/// A stored message: its `BODYSTRUCTURE` and its full raw text.
struct Stored {
    structure: String,
    raw: Vec<u8>,
}

/// In-memory mail source.
#[derive(Default)]
struct MockSource {
    messages: HashMap<MessageId, Stored>,
    structure_calls: usize,
    message_calls: usize,
    drop_last_structure: bool,
    fail: bool,
}

impl MockSource {
    fn with(mut self, id: &str, structure: &str, raw: &[u8]) -> Self {
        self.messages.insert(
            id.parse().unwrap(),
            Stored {
                structure: structure.to_string(),
                raw: raw.to_vec(),
            },
        );
        self
    }
}

impl MailSource for MockSource {
    type Error = MockError;

    async fn fetch_structures(&mut self, ids: &MessageIdSet) -> Result<Vec<String>, MockError> {
        self.structure_calls += 1;
        if self.fail {
            return Err(MockError::ConnectionReset);
        }
        let mut structures = ids
            .iter()
            .map(|id| {
                self.messages
                    .get(id)
                    .map(|m| m.structure.clone())
                    .ok_or_else(|| MockError::NoSuchMessage(id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if self.drop_last_structure {
            structures.pop();
        }
        Ok(structures)
    }

    async fn fetch_full_message(&mut self, id: &MessageId) -> Result<Vec<u8>, MockError> {
        self.message_calls += 1;
        self.messages
            .get(id)
            .map(|m| m.raw.clone())
            .ok_or_else(|| MockError::NoSuchMessage(id.clone()))
    }
}

fn ids(token: &str) -> MessageIdSet {
    MessageIdSet::from_wire_token(token).unwrap()
}

const REPORT_STRUCTURE: &str = concat!(
    r#"(("text" "plain" ("charset" "utf-8") NIL NIL "7bit" 18 1 NIL NIL NIL NIL)"#,
    r#"("application" "pdf" ("name" "report.pdf") NIL NIL "base64" 20 NIL ("attachment" ("filename" "report.pdf")) NIL NIL)"#,
    r#"("text" "plain" ("charset" "us-ascii") NIL NIL "base64" 32 1 NIL ("attachment" ("filename" "hello.txt")) NIL NIL)"#,
    r#" "mixed" ("boundary" "==b1==") NIL NIL NIL)"#
);

const REPORT_MESSAGE: &[u8] = b"From: alice@example.com\r\n\
To: bob@example.com\r\n\
Subject: Quarterly report\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"==b1==\"\r\n\
\r\n\
This is a multi-part message in MIME format.\r\n\
--==b1==\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Report attached.\r\n\
--==b1==\r\n\
Content-Type: application/pdf; name=\"report.pdf\"\r\n\
Content-Disposition: attachment; filename=\"report.pdf\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
JVBERi0xLjQg\r\n\
ZmFrZQ==\r\n\
--==b1==\r\n\
Content-Type: text/plain; charset=us-ascii\r\n\
Content-Disposition: attachment; filename=\"hello.txt\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
SGVsbG8gYXR0YWNobWVudCBieXRlcyEK\r\n\
--==b1==--\r\n";

const DUPLICATE_STRUCTURE: &str = concat!(
    r#"(("text" "plain" NIL NIL NIL "base64" 8 1 NIL ("attachment" ("filename" "a.txt")) NIL)"#,
    r#"("text" "plain" NIL NIL NIL "base64" 8 1 NIL ("attachment" ("filename" "a.txt")) NIL)"#,
    r#" "mixed" ("boundary" "dup"))"#
);

const DUPLICATE_MESSAGE: &[u8] = b"Content-Type: multipart/mixed; boundary=dup\r\n\
\r\n\
--dup\r\n\
Content-Type: text/plain\r\n\
Content-Disposition: attachment; filename=a.txt\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
Zmlyc3Q=\r\n\
--dup\r\n\
Content-Type: text/plain\r\n\
Content-Disposition: attachment; filename=a.txt\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
c2Vjb25k\r\n\
--dup--\r\n";

const LATIN1_STRUCTURE: &str = r#"("application" "octet-stream" NIL NIL NIL "base64" 8 NIL ("attachment" ("filename" "=?ISO-8859-1?Q?r=E9sum=E9.pdf?=")) NIL)"#;

const LATIN1_MESSAGE: &[u8] = b"Content-Type: application/octet-stream\r\n\
Content-Disposition: attachment;\r\n\
\tfilename=\"=?ISO-8859-1?Q?r=E9sum=E9.pdf?=\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
AAEC//4=\r\n";

const PLAIN_STRUCTURE: &str = r#"("text" "plain" ("charset" "utf-8") NIL NIL "7bit" 6 1 NIL NIL NIL NIL)"#;

const PLAIN_MESSAGE: &[u8] = b"Content-Type: text/plain; charset=utf-8\r\n\r\nhello\r\n";

#[tokio::test]
async fn index_then_extract_round_trip() {
    init_tracing();
    let source = MockSource::default().with("101", REPORT_STRUCTURE, REPORT_MESSAGE);
    let mut service = AttachmentService::new(source, IndexConfig::default());

    let index = service.build_attachment_index(&ids("101")).await.unwrap();
    let names: Vec<_> = index.locators.iter().map(|l| l.filename.as_str()).collect();
    assert_eq!(names, vec!["report.pdf", "hello.txt"]);

    let pdf = service.extract_attachment(&index.locators[0]).await.unwrap();
    assert_eq!(pdf.filename, "report.pdf");
    assert_eq!(pdf.content, b"%PDF-1.4 fake");

    let text = service.extract_attachment(&index.locators[1]).await.unwrap();
    assert_eq!(text.content, b"Hello attachment bytes!\n");

    assert_eq!(service.source().structure_calls, 1);
    assert_eq!(service.source().message_calls, 2);
}

#[tokio::test]
async fn duplicate_filenames_extract_by_ordinal() {
    init_tracing();
    let source = MockSource::default().with("5", DUPLICATE_STRUCTURE, DUPLICATE_MESSAGE);
    let mut service = AttachmentService::new(source, IndexConfig::default());

    let index = service.build_attachment_index(&ids("5")).await.unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index.locators[0].filename, index.locators[1].filename);

    let second = service.extract_attachment(&index.locators[1]).await.unwrap();
    assert_eq!(second.content, b"second");
}

#[tokio::test]
async fn malformed_structure_does_not_abort_batch() {
    init_tracing();
    let source = MockSource::default()
        .with("1", REPORT_STRUCTURE, REPORT_MESSAGE)
        .with("2", "((\"text\" \"plain\" NIL", b"")
        .with("3", DUPLICATE_STRUCTURE, DUPLICATE_MESSAGE);
    let mut service = AttachmentService::new(source, IndexConfig::default());

    let index = service.build_attachment_index(&ids("1,2,3")).await.unwrap();

    let messages: Vec<_> = index
        .locators
        .iter()
        .map(|l| l.message_id.as_str())
        .collect();
    assert_eq!(messages, vec!["1", "1", "3", "3"]);
    assert_eq!(index.skipped.len(), 1);
    assert_eq!(index.skipped[0].message_id.as_str(), "2");
}

#[tokio::test]
async fn empty_set_skips_transport() {
    init_tracing();
    let mut service = AttachmentService::new(MockSource::default(), IndexConfig::default());

    let index = service
        .build_attachment_index(&MessageIdSet::new())
        .await
        .unwrap();

    assert!(index.is_empty());
    assert!(index.skipped.is_empty());
    assert_eq!(service.source().structure_calls, 0);
}

#[tokio::test]
async fn empty_search_result_flows_through() {
    init_tracing();
    let found = MessageIdSet::from_wire_result(WireResult::ok("")).unwrap();
    assert_eq!(found.to_wire_token(), "");

    let mut service = AttachmentService::new(MockSource::default(), IndexConfig::default());
    assert!(service.build_attachment_index(&found).await.unwrap().is_empty());
}

#[tokio::test]
async fn message_without_attachments_yields_nothing() {
    init_tracing();
    let source = MockSource::default().with("9", PLAIN_STRUCTURE, PLAIN_MESSAGE);
    let mut service = AttachmentService::new(source, IndexConfig::default());

    let index = service.build_attachment_index(&ids("9")).await.unwrap();
    assert!(index.is_empty());
    assert!(index.skipped.is_empty());
}

#[tokio::test]
async fn latin1_encoded_filename() {
    init_tracing();
    let source = MockSource::default().with("12", LATIN1_STRUCTURE, LATIN1_MESSAGE);
    let mut service = AttachmentService::new(source, IndexConfig::default());

    let index = service.build_attachment_index(&ids("12")).await.unwrap();
    let locator = &index.locators[0];
    assert_eq!(locator.filename, "résumé.pdf");
    assert_eq!(locator.charset.as_deref(), Some("ISO-8859-1"));

    let bytes = service.extract_attachment(locator).await.unwrap();
    assert_eq!(bytes.filename, "résumé.pdf");
    assert_eq!(bytes.content, [0x00, 0x01, 0x02, 0xff, 0xfe]);
}

#[tokio::test]
async fn short_structure_response_is_malformed() {
    init_tracing();
    let mut source = MockSource::default()
        .with("1", PLAIN_STRUCTURE, PLAIN_MESSAGE)
        .with("2", PLAIN_STRUCTURE, PLAIN_MESSAGE);
    source.drop_last_structure = true;
    let mut service = AttachmentService::new(source, IndexConfig::default());

    let err = service
        .build_attachment_index(&ids("1,2"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MalformedResponse(_)));
}

#[tokio::test]
async fn transport_failure_is_surfaced() {
    init_tracing();
    let source = MockSource {
        fail: true,
        ..MockSource::default()
    };
    let mut service = AttachmentService::new(source, IndexConfig::default());

    let err = service.build_attachment_index(&ids("1")).await.unwrap_err();
    let Error::Transport(inner) = err else {
        panic!("expected transport error, got {err:?}");
    };
    assert_eq!(inner.to_string(), "connection reset");
}

#[tokio::test]
async fn missing_message_on_extract() {
    init_tracing();
    let mut service = AttachmentService::new(MockSource::default(), IndexConfig::default());
    let locator = AttachmentLocator {
        message_id: "404".parse().unwrap(),
        ordinal: 0,
        filename: "gone.txt".to_string(),
        charset: None,
    };

    let err = service.extract_attachment(&locator).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[test]
fn filename_policy_indexes_named_inline_parts() {
    init_tracing();
    let structure = concat!(
        r#"(("image" "png" ("name" "logo.png") NIL NIL "base64" 8 NIL ("inline" NIL) NIL)"#,
        r#"("text" "plain" NIL NIL NIL "base64" 8 1 NIL ("attachment" ("filename" "a.txt")) NIL)"#,
        r#" "related")"#
    );
    let message: &[u8] = b"Content-Type: multipart/related; boundary=r\r\n\
\r\n\
--r\r\n\
Content-Type: image/png; name=logo.png\r\n\
Content-Disposition: inline\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
AAEC//4=\r\n\
--r\r\n\
Content-Type: text/plain\r\n\
Content-Disposition: attachment; filename=a.txt\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
Zmlyc3Q=\r\n\
--r--\r\n";

    let config = IndexConfig::builder()
        .policy(AttachmentPolicy::DispositionOrFilename)
        .build();
    let source = MockSource::default().with("3", structure, message);
    let mut service = AttachmentService::new(source, config);

    tokio_test::block_on(async {
        let index = service.build_attachment_index(&ids("3")).await.unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.locators[0].filename, "logo.png");

        let text = service.extract_attachment(&index.locators[1]).await.unwrap();
        assert_eq!(text.content, b"first");
    });
}

#[test]
fn locators_serialize_for_persistence() {
    let locator = AttachmentLocator {
        message_id: "77".parse().unwrap(),
        ordinal: 1,
        filename: "café.txt".to_string(),
        charset: Some("ISO-8859-1".to_string()),
    };

    let json = serde_json::to_string(&locator).unwrap();
    assert_eq!(
        json,
        r#"{"message_id":"77","ordinal":1,"filename":"café.txt","charset":"ISO-8859-1"}"#
    );
    let back: AttachmentLocator = serde_json::from_str(&json).unwrap();
    assert_eq!(back, locator);

    let invalid = serde_json::from_str::<AttachmentLocator>(
        r#"{"message_id":"7 8","ordinal":0,"filename":"x","charset":null}"#,
    );
    assert!(invalid.is_err());
}
