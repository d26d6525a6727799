use std::path::{Path, PathBuf};

use rmcp::{
    ServiceExt,
    model::CallToolRequestParams,
    transport::{ConfigureCommandExt, TokioChildProcess},
};
use serde_json::json;
use simsapa::{Corpus, DataDir, Indexes, SchemaName, import};

const FIXTURE: &str = r#"{
    "suttas": [
        {
            "uid": "sn56.11/en/sujato",
            "sutta_ref": "SN 56.11",
            "title": "Rolling Forth the Wheel of Dhamma",
            "content_html": "<p>These two extremes should not be cultivated by one who has gone forth.</p>"
        },
        {
            "uid": "sn56.11/pli/ms",
            "sutta_ref": "SN 56.11",
            "title": "Dhammacakkappavattanasutta",
            "content_plain": "Dveme, bhikkhave, antā pabbajitena na sevitabbā."
        }
    ],
    "multi_refs": [
        { "collection": "sn", "ref_type": "pts", "ref": "sn v 420", "sutta_uid": "sn56.11" }
    ]
}"#;

fn setup_fixture(root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = root.join("fixture.json");
    std::fs::write(&file, FIXTURE)?;

    let data_dir = DataDir::resolve(Some(root))?;
    let mut corpus = Corpus::open_data_dir(&data_dir)?;
    import::import_path(&mut corpus, SchemaName::AppData, &file)?;

    let mut indexes = Indexes::open_all(&data_dir, &corpus)?;
    indexes.index_all(&corpus, false)?;

    Ok(())
}

fn text_of(result: &rmcp::model::CallToolResult) -> String {
    result
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.clone())
        .unwrap_or_default()
}

#[tokio::test]
async fn mcp_stdio_search_and_get_roundtrip()
-> Result<(), Box<dyn std::error::Error>> {
    let tempdir = tempfile::tempdir()?;
    setup_fixture(tempdir.path())?;

    let bin = simsapa_bin()?;
    let transport = TokioChildProcess::new(
        tokio::process::Command::new(bin).configure(|cmd| {
            cmd.arg("mcp").env("SIMSAPA_DATA_DIR", tempdir.path());
        }),
    )?;

    let client = ().serve(transport).await?;

    let args = json!({
        "query": "extremes",
        "limit": 5,
        "lang": "en"
    });
    let result = client
        .peer()
        .call_tool(CallToolRequestParams::new("sutta_search").with_arguments(args.as_object().unwrap().clone()))
        .await?;

    let structured = result.structured_content.expect("structured content");
    let results = structured
        .get("results")
        .and_then(|v| v.as_array())
        .expect("results array");
    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].get("uid").and_then(|v| v.as_str()),
        Some("sn56.11/en/sujato")
    );

    let get_args = json!({ "reference": "S v 420" });
    let get_result = client
        .peer()
        .call_tool(CallToolRequestParams::new("sutta_get").with_arguments(get_args.as_object().unwrap().clone()))
        .await?;
    assert_eq!(get_result.is_error, Some(false));
    let text = text_of(&get_result);
    assert!(text.contains("sn56.11/"));

    let pli_args = json!({ "reference": "sn56.11/pli/ms" });
    let pli_result = client
        .peer()
        .call_tool(CallToolRequestParams::new("sutta_get").with_arguments(pli_args.as_object().unwrap().clone()))
        .await?;
    assert!(text_of(&pli_result).contains("Dveme, bhikkhave"));

    client.cancel().await?;
    Ok(())
}

fn simsapa_bin() -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Ok(bin) = std::env::var("CARGO_BIN_EXE_simsapa") {
        return Ok(PathBuf::from(bin));
    }

    let mut path = std::env::current_exe()?;
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push("simsapa");

    if cfg!(windows) {
        path.set_extension("exe");
    }

    Ok(path)
}
