// Resume Normalizer LLM prompt templates.
// All prompts for the resume module are defined here.

pub const RESUME_SYSTEM: &str = "\
You extract concise hiring signals from resumes. \
Output strict JSON only, no markdown.";

/// Structure contract sent with every request, text or multimodal.
pub const RESUME_STRUCTURE: &str = r#"
Return EXACT JSON with keys:
{
  "name": "Full name or '' if unknown",
  "email": "lowercased email or '' if none",
  "short_description": "Two punchy lines, plain text.",
  "skills": ["skill1","skill2","skill3"],
  "yearsExperience": 0,
  "university": "University name or '' if unknown",
  "yearOfStudy": 0
}

Field notes:
- skills: 5-12 items, short nouns like "React", "AWS".
- yearsExperience: integer best estimate.
- yearOfStudy: integer year 1..8 if currently studying, -1 if graduated, 0 if unclear or unknown.

Rules:
- JSON only. No extra keys, no markdown.
- If unknown: skills=[], yearsExperience=0, university="", name="", email="", yearOfStudy=0.
- Prefer technical skills; avoid soft/buzz words.
- Email must be a valid address if present; otherwise return "".
- For yearOfStudy: if the resume clearly indicates the candidate already graduated,
  return -1. If clearly a current student, return an integer 1..8. If unclear, return 0.
"#;

/// Builds the user prompt for the plain-text (locally extracted PDF) path.
pub fn plaintext_prompt(resume_text: &str) -> String {
    format!("The following is raw resume text:\n---\n{resume_text}\n---\n{RESUME_STRUCTURE}")
}
