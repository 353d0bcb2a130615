use crate::core::distance::describe_distance;
use crate::models::{AreaInfo, Landmark, SourceDocument, Subject};
use crate::services::{GenerationError, TextGenerator};
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

/// Fixed opening for narratives about an area rather than a landmark
pub const AREA_LEAD_IN: &str = "There is no specific landmark around you, however";

/// Narrative strategies, tried in this order until one produces text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Generative,
    Template,
}

impl Tier {
    pub const ORDER: [Tier; 2] = [Tier::Generative, Tier::Template];
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Generative => write!(f, "generative"),
            Tier::Template => write!(f, "template"),
        }
    }
}

/// A tier that declined, and why
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTier {
    pub tier: Tier,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Narration {
    pub text: String,
    pub used_generative_path: bool,
    pub skipped: Vec<SkippedTier>,
}

/// Produces spoken text for a subject: generative first, template otherwise
#[derive(Clone)]
pub struct NarrativeSynthesizer {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl NarrativeSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Never fails and never returns empty text
    pub async fn synthesize(&self, subject: &Subject, sources: &[SourceDocument]) -> Narration {
        let mut skipped = Vec::new();

        for tier in Tier::ORDER {
            match self.attempt(tier, subject, sources).await {
                Ok(text) => {
                    tracing::debug!("Narrative for '{}' produced by {} tier", subject.display_name(), tier);
                    return Narration {
                        text,
                        used_generative_path: tier == Tier::Generative,
                        skipped,
                    };
                }
                Err(reason) => {
                    tracing::warn!("{} narrative skipped for '{}': {}", tier, subject.display_name(), reason);
                    skipped.push(SkippedTier { tier, reason });
                }
            }
        }

        Narration {
            text: template_narrative(subject),
            used_generative_path: false,
            skipped,
        }
    }

    async fn attempt(&self, tier: Tier, subject: &Subject, sources: &[SourceDocument]) -> Result<String, String> {
        match tier {
            Tier::Generative => self.generate(subject, sources).await.map_err(|e| e.to_string()),
            Tier::Template => Ok(template_narrative(subject)),
        }
    }

    async fn generate(&self, subject: &Subject, sources: &[SourceDocument]) -> Result<String, GenerationError> {
        let prompt = build_prompt(subject, sources);

        let text = tokio::time::timeout(self.timeout, self.generator.generate(&prompt, self.timeout))
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout))??;

        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

/// Prompt for the generative tier: subject attributes, sources, instructions
pub fn build_prompt(subject: &Subject, sources: &[SourceDocument]) -> String {
    let mut prompt = String::new();

    match subject {
        Subject::Landmark(landmark) => describe_landmark(&mut prompt, landmark),
        Subject::Area(area) => describe_area(&mut prompt, area),
    }

    prompt.push_str("\nSources:\n");
    if sources.is_empty() {
        prompt.push_str("(none)\n");
    }
    for (i, source) in sources.iter().enumerate() {
        let _ = writeln!(prompt, "[{}] {} ({})", i + 1, source.title, source.url);
        if let Some(excerpt) = &source.excerpt {
            let _ = writeln!(prompt, "    {}", excerpt);
        }
    }

    prompt.push_str(
        "\nInstructions:\n\
         - Use only the facts supplied above. Do not invent names, dates or details.\n\
         - Write 60 to 120 words meant to be spoken aloud.\n\
         - Vary the sentence structure; do not follow a fixed pattern.\n\
         - Plain text only, no markup, lists or headings.\n",
    );

    match subject {
        Subject::Landmark(_) => prompt.push_str(
            "- Foreground historical causality: why it is here, why it was designed this way, why it matters.\n",
        ),
        Subject::Area(_) => {
            let _ = writeln!(prompt, "- Begin with: \"{}…\"", AREA_LEAD_IN);
        }
    }

    prompt
}

fn describe_landmark(prompt: &mut String, landmark: &Landmark) {
    let _ = writeln!(prompt, "Landmark: {}", landmark.name);
    if !landmark.category.is_empty() {
        let _ = writeln!(prompt, "Category: {}", landmark.category);
    }
    if let Some(address) = &landmark.address {
        let _ = writeln!(prompt, "Address: {}", address);
    }
    if let Some(rating) = landmark.rating {
        let _ = writeln!(prompt, "Rating: {:.1}/10", rating);
    }
    let _ = writeln!(prompt, "Distance: {:.0} meters", landmark.distance_m);
    let _ = writeln!(
        prompt,
        "Coordinates: {:.5}, {:.5}",
        landmark.coordinates.latitude, landmark.coordinates.longitude
    );
    if let Some(description) = &landmark.description {
        let _ = writeln!(prompt, "Description: {}", description);
    }
}

fn describe_area(prompt: &mut String, area: &AreaInfo) {
    let _ = writeln!(prompt, "Area: {}", area.name);
    if let Some(city) = &area.city {
        let _ = writeln!(prompt, "City: {}", city);
    }
    if !area.display_name.is_empty() {
        let _ = writeln!(prompt, "Full location: {}", area.display_name);
    }
    for (key, value) in &area.address {
        let _ = writeln!(prompt, "{}: {}", key, value);
    }
}

/// Category keyword groups and their contextual sentence, first match wins
const CONTEXT_GROUPS: &[(&[&str], &str)] = &[
    (
        &["monument", "memorial"],
        "It stands as a monument, built so that a moment or a person would not be forgotten.",
    ),
    (
        &["museum"],
        "Inside, its collections gather stories that span generations.",
    ),
    (
        &["historic", "heritage", "castle", "palace", "ruin"],
        "This historic site has watched the city change around it for a very long time.",
    ),
    (
        &["church", "cathedral", "temple", "mosque", "synagogue", "chapel", "shrine", "basilica"],
        "For generations it has been a sacred space, a place for quiet reflection and worship.",
    ),
    (
        &["plaza", "square", "piazza"],
        "Squares like this one have long been where the life of the city gathers.",
    ),
];

fn context_sentence(category: &str) -> String {
    let lower = category.to_lowercase();
    CONTEXT_GROUPS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, sentence)| sentence.to_string())
        .unwrap_or_else(|| {
            if lower.trim().is_empty() {
                "It is one of the notable places in this part of town.".to_string()
            } else {
                format!("It is known around here as a {}.", lower.trim())
            }
        })
}

/// Deterministic narrative; identical input always gives identical text
pub fn template_narrative(subject: &Subject) -> String {
    match subject {
        Subject::Landmark(landmark) => landmark_template(landmark),
        Subject::Area(area) => area_template(area),
    }
}

fn landmark_template(landmark: &Landmark) -> String {
    let mut sentences = vec![
        format!("{} is {}.", landmark.name, describe_distance(landmark.distance_m)),
        context_sentence(&landmark.category),
    ];

    match landmark.description.as_deref().map(str::trim) {
        Some(description) if !description.is_empty() => {
            let mut description = description.to_string();
            if !description.ends_with(['.', '!', '?']) {
                description.push('.');
            }
            sentences.push(description);
        }
        _ => sentences.push("Locals and visitors alike stop here to take in its character.".to_string()),
    }

    sentences.push("Take a moment to look around and enjoy it.".to_string());
    sentences.join(" ")
}

fn area_template(area: &AreaInfo) -> String {
    let place = match &area.city {
        Some(city) if !city.eq_ignore_ascii_case(&area.name) => format!("{}, {}", area.name, city),
        _ => area.name.clone(),
    };
    format!(
        "{} you are in {}, an area worth exploring at your own pace.",
        AREA_LEAD_IN, place
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    enum FixedGenerator {
        Text(&'static str),
        Unavailable,
    }

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, _prompt: &str, _timeout: Duration) -> Result<String, GenerationError> {
            match self {
                FixedGenerator::Text(text) => Ok(text.to_string()),
                FixedGenerator::Unavailable => Err(GenerationError::Unavailable),
            }
        }
    }

    struct SlowGenerator;

    #[async_trait]
    impl TextGenerator for SlowGenerator {
        async fn generate(&self, _prompt: &str, _timeout: Duration) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".to_string())
        }
    }

    fn create_landmark(category: &str, distance_m: f64, description: Option<&str>) -> Landmark {
        Landmark {
            id: "fsq1".to_string(),
            name: "Charles Bridge".to_string(),
            category: category.to_string(),
            distance_m,
            coordinates: Coordinates::new(50.0865, 14.4114),
            rating: Some(9.3),
            address: Some("Karlův most, Praha".to_string()),
            description: description.map(str::to_string),
        }
    }

    fn create_area(city: Option<&str>) -> AreaInfo {
        AreaInfo {
            name: "Malá Strana".to_string(),
            city: city.map(str::to_string),
            display_name: "Malá Strana, Prague, Czechia".to_string(),
            address: BTreeMap::from([("country".to_string(), "Czechia".to_string())]),
            coordinates: Coordinates::new(50.0878, 14.4036),
        }
    }

    #[test]
    fn test_template_is_deterministic() {
        let subject = Subject::Landmark(create_landmark("Bridge", 240.0, None));
        assert_eq!(template_narrative(&subject), template_narrative(&subject));
    }

    #[test]
    fn test_template_landmark_sentences() {
        let text = template_narrative(&Subject::Landmark(create_landmark("War Memorial", 80.0, None)));
        assert!(text.starts_with("Charles Bridge is right here."));
        assert!(text.contains("monument"));
        assert!(text.contains("Locals and visitors"));
        assert!(text.ends_with("enjoy it."));

        let text = template_narrative(&Subject::Landmark(create_landmark(
            "Bridge",
            3400.0,
            Some("Gothic stone bridge from 1357"),
        )));
        assert!(text.contains("about 3.4 kilometers away"));
        assert!(text.contains("known around here as a bridge."));
        assert!(text.contains("Gothic stone bridge from 1357."));
    }

    #[test]
    fn test_context_groups_first_match_wins() {
        // "Memorial Museum" hits the monument group before the museum group
        assert!(context_sentence("Memorial Museum").contains("monument"));
        assert!(context_sentence("Art Museum").contains("collections"));
        assert!(context_sentence("Historic Site").contains("historic site"));
        assert!(context_sentence("Cathedral").contains("sacred space"));
        assert!(context_sentence("Plaza").contains("Squares"));
        assert!(context_sentence("").contains("notable places"));
    }

    #[test]
    fn test_area_template() {
        let text = template_narrative(&Subject::Area(create_area(Some("Prague"))));
        assert!(text.starts_with(AREA_LEAD_IN));
        assert!(text.contains("Malá Strana, Prague"));

        let text = template_narrative(&Subject::Area(create_area(None)));
        assert!(text.contains("you are in Malá Strana,"));
    }

    #[test]
    fn test_prompt_contents() {
        let sources = vec![SourceDocument::new(
            "Charles Bridge",
            "https://en.wikipedia.org/wiki/Charles_Bridge",
            Some("Construction started in 1357.".to_string()),
        )];
        let prompt = build_prompt(&Subject::Landmark(create_landmark("Bridge", 240.0, None)), &sources);
        assert!(prompt.contains("Landmark: Charles Bridge"));
        assert!(prompt.contains("Rating: 9.3/10"));
        assert!(prompt.contains("[1] Charles Bridge (https://en.wikipedia.org/wiki/Charles_Bridge)"));
        assert!(prompt.contains("Construction started in 1357."));
        assert!(prompt.contains("why it matters"));

        let prompt = build_prompt(&Subject::Area(create_area(Some("Prague"))), &[]);
        assert!(prompt.contains("Area: Malá Strana"));
        assert!(prompt.contains(AREA_LEAD_IN));
        assert!(prompt.contains("(none)"));
    }

    #[tokio::test]
    async fn test_generative_tier_used_when_available() {
        let synthesizer = NarrativeSynthesizer::new(
            Arc::new(FixedGenerator::Text("A bridge with six centuries behind it.")),
            Duration::from_secs(1),
        );
        let narration = synthesizer
            .synthesize(&Subject::Landmark(create_landmark("Bridge", 240.0, None)), &[])
            .await;
        assert!(narration.used_generative_path);
        assert!(narration.skipped.is_empty());
        assert_eq!(narration.text, "A bridge with six centuries behind it.");
    }

    #[tokio::test]
    async fn test_unavailable_falls_back_to_template() {
        let synthesizer = NarrativeSynthesizer::new(
            Arc::new(FixedGenerator::Unavailable),
            Duration::from_secs(1),
        );
        let subject = Subject::Landmark(create_landmark("Bridge", 240.0, None));
        let narration = synthesizer.synthesize(&subject, &[]).await;

        assert!(!narration.used_generative_path);
        assert_eq!(narration.text, template_narrative(&subject));
        assert_eq!(narration.skipped.len(), 1);
        assert_eq!(narration.skipped[0].tier, Tier::Generative);
    }

    #[tokio::test]
    async fn test_blank_generation_falls_back() {
        let synthesizer = NarrativeSynthesizer::new(Arc::new(FixedGenerator::Text("   ")), Duration::from_secs(1));
        let narration = synthesizer
            .synthesize(&Subject::Area(create_area(Some("Prague"))), &[])
            .await;
        assert!(!narration.used_generative_path);
        assert!(narration.text.starts_with(AREA_LEAD_IN));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_timeout_falls_back() {
        let synthesizer = NarrativeSynthesizer::new(Arc::new(SlowGenerator), Duration::from_millis(200));
        let narration = synthesizer
            .synthesize(&Subject::Landmark(create_landmark("Bridge", 240.0, None)), &[])
            .await;
        assert!(!narration.used_generative_path);
        assert!(narration.skipped[0].reason.contains("timed out"));
    }
}
