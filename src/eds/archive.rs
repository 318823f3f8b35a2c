//! Corp-code archive ingestion.
//!
//! EDS distributes the full company directory as a ZIP archive holding one
//! XML document (`result` root with `status`, `message` and repeated `list`
//! elements). The sync path downloads the archive, parses it and upserts the
//! directory, so re-running a sync with identical upstream bytes leaves the
//! directory unchanged.

use std::io::{Cursor, Read};

use serde::Deserialize;
use tracing::{info, warn};

use super::client::EdsClient;
use super::types::STATUS_OK;
use crate::database::CorpCodeRepository;
use crate::error::{ServiceError, ServiceResult};

/// One directory entry as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpCodeEntry {
    pub corp_code: String,
    pub corp_name: String,
    pub corp_name_eng: Option<String>,
    pub stock_code: Option<String>,
    /// YYYYMMDD, preserved from the archive.
    pub modify_date: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "result")]
struct CorpCodeDocument {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "list")]
    entries: Vec<RawCorpCodeEntry>,
}

#[derive(Debug, Deserialize)]
struct RawCorpCodeEntry {
    #[serde(default)]
    corp_code: Option<String>,
    #[serde(default)]
    corp_name: Option<String>,
    #[serde(default)]
    corp_eng_name: Option<String>,
    #[serde(default)]
    stock_code: Option<String>,
    #[serde(default)]
    modify_date: Option<String>,
}

/// Unpack the ZIP body and parse the contained XML directory.
pub fn parse_corp_code_archive(body: &[u8]) -> ServiceResult<Vec<CorpCodeEntry>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(body)).map_err(|e| {
        ServiceError::TransientParsing(format!("corp-code archive is not a ZIP: {}", e))
    })?;

    if archive.is_empty() {
        return Err(ServiceError::TransientParsing(
            "corp-code archive contains no files".to_string(),
        ));
    }

    // The archive ships a single XML file; fall back to the first entry if
    // the name convention ever changes.
    let xml_name = archive
        .file_names()
        .find(|name| name.to_ascii_lowercase().ends_with(".xml"))
        .map(str::to_string);

    let mut xml = String::new();
    match xml_name {
        Some(name) => archive
            .by_name(&name)
            .map_err(|e| {
                ServiceError::TransientParsing(format!("corp-code archive entry unreadable: {}", e))
            })?
            .read_to_string(&mut xml),
        None => archive
            .by_index(0)
            .map_err(|e| {
                ServiceError::TransientParsing(format!("corp-code archive entry unreadable: {}", e))
            })?
            .read_to_string(&mut xml),
    }
    .map_err(|e| {
        ServiceError::TransientParsing(format!("corp-code XML is not valid UTF-8: {}", e))
    })?;

    let document: CorpCodeDocument = quick_xml::de::from_str(&xml).map_err(|e| {
        ServiceError::TransientParsing(format!("corp-code XML unparseable: {}", e))
    })?;

    if document.status != STATUS_OK {
        return Err(ServiceError::ExternalSource(format!(
            "corp-code archive carries business error: status={}, message={}",
            document.status,
            document.message.as_deref().unwrap_or("-")
        )));
    }

    let mut entries = Vec::with_capacity(document.entries.len());
    for raw in document.entries {
        let corp_code = match raw.corp_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => {
                warn!("Skipping directory entry without corp_code");
                continue;
            }
        };
        let corp_name = match raw.corp_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                warn!("Skipping directory entry without corp_name: corp_code={}", corp_code);
                continue;
            }
        };
        entries.push(CorpCodeEntry {
            corp_code,
            corp_name,
            corp_name_eng: non_blank(raw.corp_eng_name),
            stock_code: non_blank(raw.stock_code),
            modify_date: raw
                .modify_date
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
        });
    }

    Ok(entries)
}

/// Download the archive and reconcile the full directory.
pub async fn sync_directory(
    client: &EdsClient,
    repository: &CorpCodeRepository,
) -> ServiceResult<usize> {
    let body = client.fetch_corp_code_archive().await?;
    let entries = parse_corp_code_archive(&body)?;
    info!("Corp-code archive parsed: {} entries", entries.len());

    repository
        .upsert_all(&entries)
        .await
        .map_err(ServiceError::Internal)?;
    info!("Corp-code directory sync complete: {} entries", entries.len());
    Ok(entries.len())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_archive(xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("CORPCODE.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<result>
    <status>000</status>
    <message>정상</message>
    <list>
        <corp_code>00126380</corp_code>
        <corp_name>삼성전자(주)</corp_name>
        <corp_eng_name>SAMSUNG ELECTRONICS CO,.LTD</corp_eng_name>
        <stock_code>005930</stock_code>
        <modify_date>20240102</modify_date>
    </list>
    <list>
        <corp_code>00999999</corp_code>
        <corp_name>비상장테스트</corp_name>
        <corp_eng_name> </corp_eng_name>
        <stock_code> </stock_code>
        <modify_date>20230518</modify_date>
    </list>
</result>"#;

    #[test]
    fn parses_listed_and_unlisted_entries() {
        let body = build_archive(SAMPLE_XML);
        let entries = parse_corp_code_archive(&body).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].corp_code, "00126380");
        assert_eq!(entries[0].corp_name, "삼성전자(주)");
        assert_eq!(entries[0].stock_code.as_deref(), Some("005930"));
        assert_eq!(entries[0].modify_date, "20240102");

        // Blank-padded fields on unlisted companies collapse to None.
        assert_eq!(entries[1].corp_code, "00999999");
        assert!(entries[1].stock_code.is_none());
        assert!(entries[1].corp_name_eng.is_none());
    }

    #[test]
    fn parse_is_deterministic_across_reruns() {
        let body = build_archive(SAMPLE_XML);
        let first = parse_corp_code_archive(&body).unwrap();
        let second = parse_corp_code_archive(&body).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn business_error_status_is_rejected() {
        let xml = r#"<result><status>020</status><message>사용한도 초과</message></result>"#;
        let body = build_archive(xml);
        let err = parse_corp_code_archive(&body).unwrap_err();
        assert!(matches!(err, ServiceError::ExternalSource(_)));
    }

    #[test]
    fn garbage_body_is_a_parse_failure() {
        let err = parse_corp_code_archive(b"not a zip at all").unwrap_err();
        assert!(matches!(err, ServiceError::TransientParsing(_)));
    }
}
