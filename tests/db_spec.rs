use drafter::db::Database;
use drafter::document::{Document, NodeKind};
use drafter::models::*;
use speculate2::speculate;
use uuid::Uuid;

fn report_input(topic: &str, content: &str) -> CreateReportInput {
    CreateReportInput {
        topic: topic.to_string(),
        kind: "report".to_string(),
        content: content.to_string(),
        purpose: None,
        style: None,
        pages: None,
        extras: None,
    }
}

fn record(
    source: SourceKind,
    owner_id: Uuid,
    chunk_index: usize,
    vector: Vec<f32>,
) -> EmbeddingRecord {
    EmbeddingRecord {
        source,
        owner_id,
        chunk_index,
        content: format!("chunk {}", chunk_index),
        vector,
    }
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "files" {
        it "creates missing parent directories" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("nested").join("drafter.db");

            let file_db = Database::open(path.clone()).expect("Failed to open database");
            file_db.migrate().expect("Failed to migrate");
            file_db.migrate().expect("Migrations are idempotent");

            assert!(path.exists());
            assert!(file_db.get_all_reports().expect("Query failed").is_empty());
        }
    }

    describe "reports" {
        describe "create_report" {
            it "stores every field" {
                let report = db.create_report(CreateReportInput {
                    topic: "Quarterly sales".to_string(),
                    kind: "executive summary".to_string(),
                    content: "# Sales\n\nUp 4%.".to_string(),
                    purpose: Some("Board meeting".to_string()),
                    style: Some("executive".to_string()),
                    pages: Some(3),
                    extras: Some("Use 2025 data".to_string()),
                }).expect("Failed to create report");

                let found = db.get_report(report.id).expect("Query failed").expect("Report exists");
                assert_eq!(found.topic, "Quarterly sales");
                assert_eq!(found.kind, "executive summary");
                assert_eq!(found.content, "# Sales\n\nUp 4%.");
                assert_eq!(found.purpose.as_deref(), Some("Board meeting"));
                assert_eq!(found.pages, Some(3));
                assert_eq!(found.extras.as_deref(), Some("Use 2025 data"));
            }
        }

        describe "get_report" {
            it "returns None for a non-existent report" {
                assert!(db.get_report(Uuid::new_v4()).expect("Query failed").is_none());
            }
        }

        describe "get_all_reports" {
            it "lists newest first" {
                let first = db.create_report(report_input("First", "a")).expect("create");
                let second = db.create_report(report_input("Second", "b")).expect("create");

                let reports = db.get_all_reports().expect("Query failed");
                let ids: Vec<Uuid> = reports.iter().map(|r| r.id).collect();
                assert_eq!(ids, vec![second.id, first.id]);
            }
        }

        describe "delete_report" {
            it "removes the report and its vectors" {
                let report = db.create_report(report_input("Doomed", "text")).expect("create");
                db.replace_embeddings(
                    SourceKind::Report,
                    report.id,
                    &[record(SourceKind::Report, report.id, 0, vec![1.0, 0.0])],
                    "test",
                ).expect("Failed to store vectors");

                assert!(db.delete_report(report.id).expect("Delete failed"));
                assert!(db.get_report(report.id).expect("Query failed").is_none());
                assert!(!db.has_embeddings(SourceKind::Report, report.id).expect("Query failed"));
            }

            it "returns false for a non-existent report" {
                assert!(!db.delete_report(Uuid::new_v4()).expect("Delete failed"));
            }
        }
    }

    describe "references" {
        it "stores and lists reference documents" {
            let doc = db.create_reference(CreateReferenceInput {
                name: "style-guide.md".to_string(),
                content: "Write plainly.".to_string(),
            }).expect("Failed to create reference");

            let all = db.get_all_references().expect("Query failed");
            assert_eq!(all.len(), 1);
            assert_eq!(all[0].name, "style-guide.md");
            assert_eq!(
                db.get_reference(doc.id).expect("Query failed").map(|d| d.content),
                Some("Write plainly.".to_string())
            );
        }

        it "deletes a reference with its vectors" {
            let doc = db.create_reference(CreateReferenceInput {
                name: "notes".to_string(),
                content: "Some notes".to_string(),
            }).expect("create");
            db.replace_embeddings(
                SourceKind::Reference,
                doc.id,
                &[record(SourceKind::Reference, doc.id, 0, vec![0.5])],
                "test",
            ).expect("store");

            assert!(db.delete_reference(doc.id).expect("Delete failed"));
            assert!(db.get_embeddings(None).expect("Query failed").is_empty());
            assert!(!db.delete_reference(doc.id).expect("Delete failed"));
        }
    }

    describe "embeddings" {
        it "replaces all chunks of an owner" {
            let owner = Uuid::new_v4();
            db.replace_embeddings(
                SourceKind::Report,
                owner,
                &[
                    record(SourceKind::Report, owner, 0, vec![1.0]),
                    record(SourceKind::Report, owner, 1, vec![2.0]),
                ],
                "test",
            ).expect("store");
            db.replace_embeddings(
                SourceKind::Report,
                owner,
                &[record(SourceKind::Report, owner, 0, vec![3.0])],
                "test",
            ).expect("replace");

            let records = db.get_embeddings(Some(SourceKind::Report)).expect("Query failed");
            assert_eq!(records, vec![record(SourceKind::Report, owner, 0, vec![3.0])]);
        }

        it "filters by source kind" {
            let report = Uuid::new_v4();
            let reference = Uuid::new_v4();
            db.replace_embeddings(SourceKind::Report, report, &[record(SourceKind::Report, report, 0, vec![1.0])], "test")
                .expect("store");
            db.replace_embeddings(SourceKind::Reference, reference, &[record(SourceKind::Reference, reference, 0, vec![1.0])], "test")
                .expect("store");

            assert_eq!(db.get_embeddings(None).expect("Query failed").len(), 2);
            let references = db.get_embeddings(Some(SourceKind::Reference)).expect("Query failed");
            assert_eq!(references.len(), 1);
            assert_eq!(references[0].owner_id, reference);
        }

        it "deletes the vectors of one owner" {
            let owner = Uuid::new_v4();
            db.replace_embeddings(SourceKind::Report, owner, &[record(SourceKind::Report, owner, 0, vec![1.0])], "test")
                .expect("store");

            assert!(db.has_embeddings(SourceKind::Report, owner).expect("Query failed"));
            assert_eq!(db.delete_embeddings(SourceKind::Report, owner).expect("Delete failed"), 1);
            assert!(!db.has_embeddings(SourceKind::Report, owner).expect("Query failed"));
        }
    }

    describe "outlines" {
        it "stores the document tree" {
            let mut document = Document::new();
            let intro = document.add_section(NodeKind::Title, "Introduction", None).expect("add");
            document.add_section(NodeKind::Paragraph, "Hello", Some(intro)).expect("add");

            let outline = db.create_outline("Draft".to_string(), None, document.clone())
                .expect("Failed to create outline");
            let found = db.get_outline(outline.id).expect("Query failed").expect("Outline exists");

            assert_eq!(found.title, "Draft");
            assert_eq!(found.document, document);
            assert!(found.report_id.is_none());
        }

        it "persists mutations made through with_outline_mut" {
            let outline = db.create_outline("Draft".to_string(), None, Document::new()).expect("create");

            let added = db
                .with_outline_mut(outline.id, |doc| doc.add_section(NodeKind::Title, "Scope", None))
                .expect("Update failed")
                .expect("Outline exists")
                .expect("Section added");

            let found = db.get_outline(outline.id).expect("Query failed").expect("Outline exists");
            assert_eq!(found.document.find_section_by_name("scope"), Some(added));
            assert!(found.updated_at >= outline.updated_at);
        }

        it "returns None when mutating a missing outline" {
            let result = db.with_outline_mut(Uuid::new_v4(), |doc| doc.len()).expect("Query failed");
            assert!(result.is_none());
        }

        it "keeps the outline when its report is deleted" {
            let report = db.create_report(report_input("Source", "# A")).expect("create");
            let outline = db.create_outline("From report".to_string(), Some(report.id), Document::new())
                .expect("create");

            db.delete_report(report.id).expect("Delete failed");

            let found = db.get_outline(outline.id).expect("Query failed").expect("Outline exists");
            assert!(found.report_id.is_none());
        }

        it "lists and deletes outlines" {
            let a = db.create_outline("A".to_string(), None, Document::new()).expect("create");
            db.create_outline("B".to_string(), None, Document::new()).expect("create");

            assert_eq!(db.get_all_outlines().expect("Query failed").len(), 2);
            assert!(db.delete_outline(a.id).expect("Delete failed"));
            assert!(!db.delete_outline(a.id).expect("Delete failed"));
            assert_eq!(db.get_all_outlines().expect("Query failed").len(), 1);
        }
    }
}
