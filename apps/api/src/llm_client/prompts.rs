// Prompt constants and builders for section rewrites.

/// System instruction for every rewrite. Fixed; never user-editable.
pub const OPTIMIZER_SYSTEM: &str = "You are an expert resume optimizer. \
Your task is to rewrite resume sections to maximize ATS compatibility and job description matching while preserving truthfulness.

Rules:
1. NEVER fabricate experience, skills, or achievements
2. Only enhance existing content with better keywords and phrasing
3. Maintain factual accuracy of all claims
4. Optimize for ATS scanning with relevant keywords from the job description
5. Use action verbs and quantifiable results where possible
6. Keep the same general structure and length";

/// Builds the user prompt for rewriting one section.
pub fn build_rewrite_prompt(
    section_text: &str,
    job_description: &str,
    section_label: &str,
    custom_instruction: Option<&str>,
) -> String {
    let mut prompt = format!(
        "Job Description:\n{job_description}\n\nOriginal {section_label} Section:\n{section_text}\n\n"
    );
    if let Some(instruction) = custom_instruction.map(str::trim).filter(|i| !i.is_empty()) {
        prompt.push_str(&format!("Additional Instructions: {instruction}\n\n"));
    }
    prompt.push_str(
        "Please rewrite this section to better match the job description while following all rules above. \
         Respond with the rewritten section text only.",
    );
    prompt
}
