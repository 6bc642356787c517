//! MCP server integration tests.
//!
//! Tool logic is exercised through the server's `test_*` helpers against an
//! in-memory database and a scripted language model.

mod test_helpers;

use drafter::document::render::from_markdown;
use drafter::mcp::McpServer;
use drafter::models::*;
use drafter::state::AppState;
use test_helpers::{offline_state, test_state, FakeGenerator, STRUCTURE};

/// Helper to create a test MCP server sharing its state with the test.
fn setup() -> (McpServer, AppState) {
    let state = test_state(FakeGenerator::default());
    let server = McpServer::new(state.clone());
    (server, state)
}

fn create_test_outline(state: &AppState) -> Outline {
    state
        .db
        .create_outline(
            "Draft".to_string(),
            None,
            from_markdown("# Introduction\n\nWhy this matters.\n\n## Scope\n\nEurope only.\n"),
        )
        .expect("Failed to create outline")
}

fn create_test_report(state: &AppState, topic: &str) -> Report {
    state
        .db
        .create_report(CreateReportInput {
            topic: topic.to_string(),
            kind: "report".to_string(),
            content: format!("# {}\n\nBody.", topic),
            purpose: None,
            style: None,
            pages: Some(2),
            extras: None,
        })
        .expect("Failed to create report")
}

mod assistant_tools {
    use super::*;

    #[tokio::test]
    async fn assistant_turn_walks_the_dialogue() {
        let (server, _) = setup();

        let opening = server.test_assistant_turn("s1", "hi").await.expect("Tool failed");
        assert_eq!(opening.step, Step::Purpose);

        for message in ["To brief the board", "Quarterly sales", "executive", "5"] {
            server.test_assistant_turn("s1", message).await.expect("Tool failed");
        }
        let proposal = server
            .test_assistant_turn("s1", "No constraints")
            .await
            .expect("Tool failed");
        assert_eq!(proposal.step, Step::Confirmation);
        assert_eq!(proposal.proposed_structure.as_deref(), Some(STRUCTURE));

        let done = server.test_assistant_turn("s1", "yes").await.expect("Tool failed");
        assert_eq!(done.step, Step::Finished);
        assert!(done.context.is_some());
    }

    #[tokio::test]
    async fn assistant_turn_rejects_an_empty_session_id() {
        let (server, _) = setup();

        let result = server.test_assistant_turn("  ", "hi").await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn get_conversation_returns_the_state() {
        let (server, _) = setup();
        server.test_assistant_turn("s1", "hi").await.expect("Tool failed");
        server
            .test_assistant_turn("s1", "To brief the board")
            .await
            .expect("Tool failed");

        let state = server.test_get_conversation("s1").await.expect("Tool failed");

        assert_eq!(state.step, Step::Topic);
        assert_eq!(state.purpose.as_deref(), Some("To brief the board"));
    }

    #[tokio::test]
    async fn get_conversation_fails_for_unknown_session() {
        let (server, _) = setup();

        let result = server.test_get_conversation("missing").await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn conversations_are_shared_with_the_http_state() {
        let (server, state) = setup();
        server.test_assistant_turn("shared", "hi").await.expect("Tool failed");

        assert!(state.assistant.conversation("shared").await.is_some());
    }
}

mod outline_tools {
    use super::*;

    #[tokio::test]
    async fn run_outline_command_counts_headings() {
        let (server, state) = setup();
        let outline = create_test_outline(&state);

        let result = server
            .test_run_outline_command(
                &outline.id.to_string(),
                "how many titles and subtitles are there?",
            )
            .expect("Tool failed");

        assert_eq!(result.reply, "There are 1 titles and 1 subtitles.");
        assert_eq!(result.stats.nodes, 5);
    }

    #[tokio::test]
    async fn run_outline_command_persists_deletions() {
        let (server, state) = setup();
        let outline = create_test_outline(&state);

        let result = server
            .test_run_outline_command(&outline.id.to_string(), "Delete the section scope")
            .expect("Tool failed");

        assert_eq!(result.reply, "Section scope deleted.");
        assert_eq!(result.stats.headings.subtitles, 0);

        let stored = state
            .db
            .get_outline(outline.id)
            .expect("Query failed")
            .expect("Outline exists");
        assert!(stored.document.find_section_by_name("europe").is_none());
    }

    #[tokio::test]
    async fn run_outline_command_answers_unknown_commands() {
        let (server, state) = setup();
        let outline = create_test_outline(&state);

        let result = server
            .test_run_outline_command(&outline.id.to_string(), "make it shine")
            .expect("Tool failed");

        assert_eq!(result.reply, "Command not recognized.");
    }

    #[tokio::test]
    async fn run_outline_command_fails_for_unknown_outline() {
        let (server, _) = setup();

        let result = server.test_run_outline_command(
            &uuid::Uuid::new_v4().to_string(),
            "how many titles and subtitles",
        );

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn run_outline_command_rejects_invalid_uuid() {
        let (server, _) = setup();

        let result = server.test_run_outline_command("not-a-uuid", "how many titles and subtitles");

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn render_outline_defaults_to_a_tree() {
        let (server, state) = setup();
        let outline = create_test_outline(&state);

        let tree = server
            .test_render_outline(&outline.id.to_string(), None)
            .expect("Tool failed");

        assert!(tree.starts_with("Draft\n"));
        assert!(tree.contains("□ Scope"));
    }

    #[tokio::test]
    async fn render_outline_as_markdown() {
        let (server, state) = setup();
        let outline = create_test_outline(&state);

        let markdown = server
            .test_render_outline(&outline.id.to_string(), Some("markdown"))
            .expect("Tool failed");

        assert_eq!(
            markdown,
            "# Introduction\n\nWhy this matters.\n\n## Scope\n\nEurope only.\n"
        );
    }

    #[tokio::test]
    async fn render_outline_rejects_unknown_formats() {
        let (server, state) = setup();
        let outline = create_test_outline(&state);

        let result = server.test_render_outline(&outline.id.to_string(), Some("html"));

        assert!(result.is_err());
    }
}

mod report_tools {
    use super::*;

    #[tokio::test]
    async fn list_reports_is_newest_first_and_limited() {
        let (server, state) = setup();
        create_test_report(&state, "Older");
        let newer = create_test_report(&state, "Newer");

        let all = server.test_list_reports(None).expect("Tool failed");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, newer.id);

        let limited = server.test_list_reports(Some(1)).expect("Tool failed");
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].topic, "Newer");
    }

    #[tokio::test]
    async fn get_report_returns_content() {
        let (server, state) = setup();
        let report = create_test_report(&state, "Budget");

        let found = server
            .test_get_report(&report.id.to_string())
            .expect("Tool failed");

        assert_eq!(found.content, "# Budget\n\nBody.");
        assert_eq!(found.pages, Some(2));
    }

    #[tokio::test]
    async fn get_report_fails_for_unknown_report() {
        let (server, _) = setup();

        let result = server.test_get_report(&uuid::Uuid::new_v4().to_string());

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn search_reports_ranks_indexed_reports() {
        let (server, state) = setup();
        let sales = create_test_report(&state, "Sales");
        let climate = create_test_report(&state, "Climate");
        state.retriever.index_report(&sales).await.expect("Index failed");
        state.retriever.index_report(&climate).await.expect("Index failed");

        let hits = server
            .test_search_reports("climate", Some(1), None)
            .await
            .expect("Tool failed");

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, climate.id);
        assert_eq!(hits[0].title, "Climate");
    }

    #[tokio::test]
    async fn search_reports_rejects_unknown_scope() {
        let (server, _) = setup();

        let result = server.test_search_reports("sales", None, Some("everything")).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn search_reports_rejects_empty_query() {
        let (server, _) = setup();

        let result = server.test_search_reports("", None, None).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn search_reports_is_empty_without_embeddings() {
        let state = offline_state();
        let server = McpServer::new(state.clone());
        create_test_report(&state, "Sales");

        let hits = server
            .test_search_reports("sales", None, Some("all"))
            .await
            .expect("Tool failed");

        assert!(hits.is_empty());
    }
}
