use anyhow::{Context, bail};

/// Pulls the full text out of a PDF, page by page, in page order.
///
/// The extracted text is stored verbatim as the history record's original
/// input, so the word-reduction analytics stay accurate.
pub fn extract_text(bytes: &[u8]) -> anyhow::Result<String> {
    let doc = lopdf::Document::load_mem(bytes).context("failed to parse PDF")?;

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        bail!("PDF has no pages");
    }

    let text = doc
        .extract_text(&page_numbers)
        .context("failed to extract text from PDF")?;

    let text = text.trim().to_string();
    if text.is_empty() {
        bail!("PDF contains no extractable text");
    }

    Ok(text)
}
