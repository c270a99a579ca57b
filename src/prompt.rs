//! Prompt selection and assembly.

/// Default prompt when a single image is remixed.
pub const SINGLE_IMAGE_PROMPT: &str = "Turn this image into a professional quality studio shoot with better lighting and depth of field.";

/// Default prompt when several images are combined.
pub const MULTI_IMAGE_PROMPT: &str =
    "Combine the subjects of these images in a natural way, producing a new image.";

/// Default base prompt for the style pipeline.
pub const DEFAULT_BASE_PROMPT: &str = "Recreate this photo as a postcard illustration while preserving the main subject and proportions.";

/// Instruction sent with the reference images to obtain a style summary.
pub const STYLE_SUMMARY_INSTRUCTIONS: &str = "You are an art director. Summarize the shared visual style, typography, color \
palette, texture, and any notable graphic elements in these reference \
postcards. Return 3-5 concise bullet points highlighting the style traits.";

/// Picks the prompt for a remix call.
///
/// A non-blank user prompt is used verbatim. Otherwise the default depends
/// on how many images are being remixed.
pub fn build_prompt(image_count: usize, user_prompt: Option<&str>) -> String {
    match user_prompt {
        Some(prompt) if !prompt.trim().is_empty() => prompt.to_string(),
        _ if image_count == 1 => SINGLE_IMAGE_PROMPT.to_string(),
        _ => MULTI_IMAGE_PROMPT.to_string(),
    }
}

/// Combines the operator's base prompt with a style summary.
pub fn build_style_prompt(base_prompt: &str, style_summary: &str) -> String {
    format!(
        "{}\n\nApply the following postcard style details to the target photo while \
         preserving the primary subject and composition:\n{}",
        base_prompt.trim(),
        style_summary.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_image_default() {
        assert_eq!(build_prompt(1, None), SINGLE_IMAGE_PROMPT);
        assert_eq!(build_prompt(1, Some("")), SINGLE_IMAGE_PROMPT);
    }

    #[test]
    fn test_multi_image_default() {
        for count in 2..=5 {
            assert_eq!(build_prompt(count, None), MULTI_IMAGE_PROMPT);
        }
        assert_eq!(build_prompt(3, Some("   \n")), MULTI_IMAGE_PROMPT);
    }

    #[test]
    fn test_user_prompt_passes_through() {
        let prompt = "Create a product advertisement featuring the man wearing the cap";
        for count in 1..=5 {
            assert_eq!(build_prompt(count, Some(prompt)), prompt);
        }
        assert_eq!(build_prompt(1, Some("  keep the cat ")), "  keep the cat ");
    }

    #[test]
    fn test_style_prompt_layout() {
        let prompt = build_style_prompt("Make a postcard", "- bold serif type\n- teal palette\n");
        assert!(prompt.starts_with("Make a postcard\n\nApply the following postcard style"));
        assert!(prompt.contains("preserving the primary subject and composition:\n"));
        assert!(prompt.ends_with("- bold serif type\n- teal palette"));
    }

    #[test]
    fn test_default_base_prompt() {
        assert_eq!(
            DEFAULT_BASE_PROMPT,
            "Recreate this photo as a postcard illustration while preserving the main subject and proportions."
        );
        let prompt = build_style_prompt(DEFAULT_BASE_PROMPT, "- sepia");
        assert!(prompt.starts_with("Recreate this photo as a postcard illustration"));
    }
}
