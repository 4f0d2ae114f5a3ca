use contentgen_backend::helper::prompt_builder::{build_prompt, EMOJI_DISABLED, EMOJI_ENABLED, LOANWORD_RULE};
use contentgen_backend::models::generation::{GenerationForm, GenerationRequest};
use contentgen_backend::models::reference_table::{lookup_reference_in, ReferenceEntry};
use serde_json::json;

fn request_from(value: serde_json::Value) -> GenerationRequest {
    let form: GenerationForm = serde_json::from_value(value).expect("form should deserialize");
    form.validate().expect("form should validate")
}

fn coffee_request() -> GenerationRequest {
    request_from(json!({
        "topic": "coffee",
        "purpose": "sell",
        "audience": "young adults",
        "writingStyle": "casual",
        "wordCount": 300,
        "outputLanguage": "English",
        "keywords": "",
        "cta": "Buy now",
        "negativeConstraints": "",
        "hashtags": "",
        "emoji": false
    }))
}

#[test]
fn coffee_scenario_end_to_end() {
    let prompt = build_prompt(&coffee_request());

    assert!(prompt.contains("Buy now"));
    assert!(prompt.contains("Call to Action: Buy now\n"));
    assert!(prompt.contains("Length: about 300 words\n"));
    assert!(prompt.contains("Tone: casual\n"));
    assert!(!prompt.contains("Hashtags:"));
    assert!(!prompt.contains("Keywords:"));
    assert!(!prompt.contains("Negative Constraints:"));
    assert!(!prompt.contains(EMOJI_ENABLED));
    assert!(prompt.contains(EMOJI_DISABLED));
}

#[test]
fn building_twice_gives_identical_output() {
    let english = coffee_request();
    assert_eq!(build_prompt(&english), build_prompt(&english));

    let myanmar = request_from(json!({
        "topic": "tea",
        "purpose": "Brand Awareness",
        "writingStyle": ["warm", "friendly", "calm"],
        "contentLength": "short",
        "outputLanguage": "Myanmar"
    }));
    assert_eq!(build_prompt(&myanmar), build_prompt(&myanmar));
}

#[test]
fn loanword_rule_only_in_myanmar() {
    let english = coffee_request();
    assert!(!build_prompt(&english).contains(LOANWORD_RULE));

    let myanmar = request_from(json!({
        "topic": "coffee",
        "writingStyle": "casual",
        "wordCount": 300,
        "outputLanguage": "Myanmar"
    }));
    assert!(build_prompt(&myanmar).contains(LOANWORD_RULE));
}

#[test]
fn hashtags_section_appears_once_when_given() {
    let mut absent = coffee_request();
    absent.hashtags = None;
    assert!(!build_prompt(&absent).contains("Hashtags:"));

    let mut present = coffee_request();
    present.hashtags = Some("#a #b".into());
    let prompt = build_prompt(&present);
    assert_eq!(prompt.matches("Hashtags:").count(), 1);
    assert!(prompt.lines().any(|line| line == "Hashtags: #a #b"));
}

#[test]
fn length_tiers_fall_back_to_long() {
    let cases = [
        (Some("short"), 350),
        (Some("medium"), 500),
        (Some("long"), 650),
        (Some("epic"), 650),
        (None, 650),
    ];
    for (tier, words) in cases {
        let mut form = json!({
            "topic": "coffee",
            "writingStyle": ["a", "b", "c"],
            "outputLanguage": "English"
        });
        if let Some(tier) = tier {
            form["contentLength"] = json!(tier);
        }
        let prompt = build_prompt(&request_from(form));
        assert!(
            prompt.contains(&format!("Length: about {} words\n", words)),
            "tier {:?} should map to {} words",
            tier,
            words
        );
    }
}

#[test]
fn image_descriptions_are_numbered() {
    let request = request_from(json!({
        "topic": "cats",
        "writingStyle": ["a", "b", "c"],
        "outputLanguage": "English",
        "imageDescriptions": ["a cat", "", null]
    }));
    let prompt = build_prompt(&request);
    assert!(prompt.contains(
        "Description of Image 1: a cat\nDescription of Image 2: \nDescription of Image 3: \n"
    ));
}

#[test]
fn reference_lookup_prefers_the_later_entry() {
    let table = [
        ReferenceEntry { purpose: "sell", content: "first" },
        ReferenceEntry { purpose: "sell more", content: "second" },
    ];
    assert_eq!(lookup_reference_in(&table, "sell more today"), "second");

    let reversed = [table[1], table[0]];
    assert_eq!(lookup_reference_in(&reversed, "sell more today"), "first");
}
