/*!
 * Prompt text for heritage translation requests.
 */

/// Fixed system instruction sent with every job
pub const SYSTEM_INSTRUCTION: &str = "You are an expert translator of Korean cultural heritage. \
Translate the heritage name and description into natural English. \
Respond with strict JSON only, with exactly two string fields: \
\"name_en\" (English name) and \"content_en\" (English description).";

const NAME_LABEL: &str = "Heritage name: ";
const DESCRIPTION_LABEL: &str = "Description: ";
const SHAPE_HINT: &str = "JSON: {\"name_en\": \"English name\", \"content_en\": \"English description\"}";

/// User payload embedding the native fields and the expected answer shape
pub fn user_payload(name: &str, content: &str) -> String {
    format!(
        "{}{}\n{}{}\n\n{}",
        NAME_LABEL,
        name.replace('\n', " "),
        DESCRIPTION_LABEL,
        content,
        SHAPE_HINT
    )
}

/// Recover the native name and description from a user payload
pub fn native_fields(payload: &str) -> (String, String) {
    let body = payload
        .rsplit_once("\n\nJSON:")
        .map(|(head, _)| head)
        .unwrap_or(payload);

    let Some(rest) = body.strip_prefix(NAME_LABEL) else {
        return (String::new(), String::new());
    };

    match rest.split_once(&format!("\n{}", DESCRIPTION_LABEL)) {
        Some((name, content)) => (name.to_string(), content.to_string()),
        None => (rest.to_string(), String::new()),
    }
}
