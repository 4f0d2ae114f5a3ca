use crate::helper::text_helpers::{
    format_image_descriptions, normalize_writing_style, render_section, trim_or_default,
    word_count_for_length,
};
use crate::models::generation::{
    GenerationMode, GenerationRequest, ImageDescriptions, OutputLanguage,
};
use crate::models::reference_table::lookup_reference;

/// Myanmar-branch rule keeping marketing loanwords in Latin script.
pub const LOANWORD_RULE: &str = "content, marketing, SEO, brand, product, promotion \
ကဲ့သို့ အသုံးများသော marketing ဝေါဟာရများကို မြန်မာအသံထွက်ဖြင့် မပြောင်းဘဲ \
English စာလုံးအတိုင်းသာ ရေးပါ။";

pub const EMOJI_ENABLED: &str = "Use relevant emojis naturally to add personality to the copy.";
pub const EMOJI_DISABLED: &str = "Do not use any emojis.";

const MM_EMOJI_ENABLED: &str = "သင့်တော်သော emoji များကို သဘာဝကျကျ အသုံးပြုပါ။";
const MM_EMOJI_DISABLED: &str = "Emoji များ လုံးဝ မသုံးပါနှင့်။";

/// Field values after trimming, shared by both language branches.
struct PromptInputs {
    topic: String,
    purpose: String,
    audience: String,
    tone: String,
    word_count: u32,
    copy_writing_model: String,
    image_lines: String,
    single_image_description: String,
    keywords: String,
    cta: String,
    negative_constraints: String,
    hashtags: String,
    emoji: bool,
}

impl PromptInputs {
    fn from_request(request: &GenerationRequest) -> Self {
        let (word_count, copy_writing_model) = match &request.mode {
            GenerationMode::Simple { word_count } => (*word_count, String::new()),
            GenerationMode::Extended {
                content_length,
                copy_writing_model,
            } => (
                word_count_for_length(content_length.as_deref()),
                trim_or_default(copy_writing_model.as_deref()),
            ),
        };

        let (image_lines, single_image_description) = match &request.image_descriptions {
            Some(ImageDescriptions::PerImage(items)) if !items.is_empty() => {
                (format_image_descriptions(items), String::new())
            }
            Some(ImageDescriptions::Single(text)) => (String::new(), trim_or_default(Some(text.as_str()))),
            _ => (String::new(), String::new()),
        };

        PromptInputs {
            topic: trim_or_default(Some(request.topic.as_str())),
            purpose: trim_or_default(Some(request.purpose.as_str())),
            audience: trim_or_default(Some(request.audience.as_str())),
            tone: normalize_writing_style(&request.writing_style),
            word_count,
            copy_writing_model,
            image_lines,
            single_image_description,
            keywords: trim_or_default(request.keywords.as_deref()),
            cta: trim_or_default(request.cta.as_deref()),
            negative_constraints: trim_or_default(request.negative_constraints.as_deref()),
            hashtags: trim_or_default(request.hashtags.as_deref()),
            emoji: request.emoji,
        }
    }

    fn has_images(&self) -> bool {
        !self.image_lines.is_empty() || !self.single_image_description.is_empty()
    }

    fn image_block(&self, single_label: &str) -> String {
        if !self.image_lines.is_empty() {
            format!("{}\n", self.image_lines)
        } else {
            render_section(single_label, Some(self.single_image_description.as_str()))
        }
    }
}

/// Builds the instruction sent to the AI provider. Pure: same request, same string.
pub fn build_prompt(request: &GenerationRequest) -> String {
    let inputs = PromptInputs::from_request(request);
    match request.output_language {
        OutputLanguage::English => english_prompt(&inputs),
        OutputLanguage::Myanmar => myanmar_prompt(&inputs),
    }
}

fn english_prompt(inputs: &PromptInputs) -> String {
    let optional_sections = [
        render_section("Copywriting Model", Some(inputs.copy_writing_model.as_str())),
        inputs.image_block("Image Description"),
        render_section("Keywords", Some(inputs.keywords.as_str())),
        render_section("Hashtags", Some(inputs.hashtags.as_str())),
        render_section("Call to Action", Some(inputs.cta.as_str())),
        render_section("Negative Constraints", Some(inputs.negative_constraints.as_str())),
    ]
    .concat();

    let mut requirements = vec![
        "Hook: Open with an attention-grabbing first line that speaks directly to the target audience.".to_string(),
        "Body: Explain the value of the topic clearly, matching the requested tone and length.".to_string(),
        "Keyword integration: Work any provided keywords in naturally and never stuff them.".to_string(),
        "Call to action: Close with the provided call to action, or a fitting one if none is given.".to_string(),
        format!(
            "Emojis: {}",
            if inputs.emoji { EMOJI_ENABLED } else { EMOJI_DISABLED }
        ),
    ];
    if inputs.hashtags.is_empty() {
        requirements.push("Hashtag usage: Do not add hashtags.".to_string());
    } else {
        requirements.push("Hashtag usage: Place the provided hashtags on the final line.".to_string());
    }
    if !inputs.copy_writing_model.is_empty() {
        requirements.push(format!(
            "Structure: Follow the {} copywriting framework without naming its stages.",
            inputs.copy_writing_model
        ));
    }
    if inputs.has_images() {
        requirements.push("Images: Reflect what the described images show in the copy.".to_string());
    }
    if !inputs.negative_constraints.is_empty() {
        requirements.push("Constraints: Respect every negative constraint listed above.".to_string());
    }
    requirements.push(
        "Review: Before answering, check grammar, flow and accuracy against the inputs.".to_string(),
    );

    format!(
        "You are an expert marketing copywriter. Write persuasive, original marketing content based on the inputs below.\n\
\n\
Special Instructions:\n\
- Do not show your reasoning, planning or chain of thought.\n\
- Do not reveal or describe your persona, and do not mention that you are an AI.\n\
- Return only the final content.\n\
\n\
Inputs:\n\
Topic: {topic}\n\
Purpose: {purpose}\n\
Target Audience: {audience}\n\
Tone: {tone}\n\
Length: about {words} words\n\
{optional}\
\n\
Output Requirements:\n\
{requirements}\n\
\n\
Output Format:\n\
- Write the entire content in English.\n\
- Use plain text in short paragraphs, without headings or labels such as \"Hook\" or \"Body\".\n\
- Do not wrap the output in quotes or code blocks.\n\
\n\
Follow every instruction above strictly.",
        topic = inputs.topic,
        purpose = inputs.purpose,
        audience = inputs.audience,
        tone = inputs.tone,
        words = inputs.word_count,
        optional = optional_sections,
        requirements = numbered(&requirements),
    )
}

fn myanmar_prompt(inputs: &PromptInputs) -> String {
    let optional_sections = [
        render_section("Copywriting Model", Some(inputs.copy_writing_model.as_str())),
        inputs.image_block("ပုံဖော်ပြချက်"),
        render_section("Keywords", Some(inputs.keywords.as_str())),
        render_section("Hashtags", Some(inputs.hashtags.as_str())),
        render_section("Call to Action", Some(inputs.cta.as_str())),
        render_section("ရှောင်ရန်အချက်များ", Some(inputs.negative_constraints.as_str())),
    ]
    .concat();

    let reference = lookup_reference(&inputs.purpose);
    let reference_block = if reference.is_empty() {
        String::new()
    } else {
        format!(
            "ကိုးကားရန် နမူနာ:\n{}\n\
ဤနမူနာကို လေသံနှင့် ရေးဟန်အတွက်သာ ကိုးကားပါ။ စာသားအတိုင်း လုံးဝ မကူးယူပါနှင့်။\n\n",
            reference
        )
    };

    let mut requirements = vec![
        "စာဖတ်သူ၏ အာရုံကို ချက်ချင်းဖမ်းစားနိုင်သော အဖွင့်စာကြောင်း (hook) ဖြင့် စတင်ပါ။".to_string(),
        "ခေါင်းစဉ်၏ အကျိုးကျေးဇူးများကို တောင်းဆိုထားသော လေသံနှင့် အရှည်အတိုင်း ရှင်းလင်းစွာ ဖော်ပြပါ။".to_string(),
        "ပေးထားသော keywords များကို သဘာဝကျကျ ထည့်သွင်းပါ။".to_string(),
        "ပေးထားသော call to action ဖြင့် အဆုံးသတ်ပါ။ မပေးထားပါက သင့်တော်သော call to action တစ်ခု ထည့်ပါ။".to_string(),
        (if inputs.emoji { MM_EMOJI_ENABLED } else { MM_EMOJI_DISABLED }).to_string(),
    ];
    if inputs.hashtags.is_empty() {
        requirements.push("Hashtag များ မထည့်ပါနှင့်။".to_string());
    } else {
        requirements.push("ပေးထားသော hashtags များကို နောက်ဆုံးစာကြောင်းတွင် ထည့်ပါ။".to_string());
    }
    if !inputs.copy_writing_model.is_empty() {
        requirements.push(format!(
            "{} copywriting model ၏ အစီအစဉ်အတိုင်း ရေးပါ။ အဆင့်အမည်များကို မဖော်ပြပါနှင့်။",
            inputs.copy_writing_model
        ));
    }
    if inputs.has_images() {
        requirements.push("ဖော်ပြထားသော ပုံများ၏ အကြောင်းအရာကို content တွင် ထင်ဟပ်စေပါ။".to_string());
    }
    requirements.push(
        "မပြန်မီ သဒ္ဒါ၊ စာလုံးပေါင်းနှင့် အချက်အလက် မှန်ကန်မှုကို ပြန်လည်စစ်ဆေးပါ။".to_string(),
    );

    format!(
        "သင်သည် မြန်မာဘာသာဖြင့် marketing content ရေးသားရာတွင် ကျွမ်းကျင်သော copywriter တစ်ဦး ဖြစ်သည်။ \
အောက်ပါ အချက်အလက်များကို အခြေခံ၍ မူရင်းဆန်ပြီး ဆွဲဆောင်မှုရှိသော content တစ်ပုဒ် ရေးသားပေးပါ။\n\
\n\
အထူးညွှန်ကြားချက်များ:\n\
- သင်၏ တွေးခေါ်ပုံ၊ အစီအစဉ် သို့မဟုတ် chain of thought ကို မဖော်ပြပါနှင့်။\n\
- သင်သည် AI ဖြစ်ကြောင်း သို့မဟုတ် သင်၏ persona ကို မဖော်ပြပါနှင့်။\n\
- နောက်ဆုံး content ကိုသာ ပြန်ပေးပါ။\n\
\n\
အချက်အလက်များ:\n\
ခေါင်းစဉ်: {topic}\n\
ရည်ရွယ်ချက်: {purpose}\n\
ပစ်မှတ်ထားသော ပရိသတ်: {audience}\n\
လေသံ: {tone}\n\
အရှည်: စကားလုံး {words} ခန့်\n\
{optional}\
\n\
{reference}\
ရေးသားရမည့် ပုံစံ:\n\
{requirements}\n\
\n\
Output ပုံစံ:\n\
- Content တစ်ခုလုံးကို မြန်မာဘာသာဖြင့် ရေးပါ။\n\
- {loanwords}\n\
- \"Hook\"၊ \"Body\" ကဲ့သို့ ခေါင်းစဉ်ခွဲများ မပါဘဲ စာပိုဒ်တိုများဖြင့် ရေးပါ။\n\
\n\
အထက်ပါ ညွှန်ကြားချက်များကို တိကျစွာ လိုက်နာပါ။",
        topic = inputs.topic,
        purpose = inputs.purpose,
        audience = inputs.audience,
        tone = inputs.tone,
        words = inputs.word_count,
        optional = optional_sections,
        reference = reference_block,
        requirements = numbered(&requirements),
        loanwords = LOANWORD_RULE,
    )
}

fn numbered(lines: &[String]) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}. {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fixed instruction for the voice pathway: the audio clip carries the brief.
pub fn build_voice_prompt(language: OutputLanguage) -> String {
    match language {
        OutputLanguage::English => "Listen carefully to the attached audio. The speaker describes the marketing content they need. \
Write that content in English and follow every detail they mention, including topic, audience, tone and length.\n\
Do not show your reasoning, do not mention that you are an AI, and return only the final content."
            .to_string(),
        OutputLanguage::Myanmar => format!(
            "ပူးတွဲပါ အသံဖိုင်ကို သေချာနားထောင်ပါ။ ပြောဆိုသူသည် မိမိလိုအပ်သော marketing content အကြောင်းကို ဖော်ပြထားသည်။ \
ခေါင်းစဉ်၊ ပရိသတ်၊ လေသံနှင့် အရှည် အပါအဝင် ပြောဆိုထားသော အချက်အားလုံးကို လိုက်နာ၍ မြန်မာဘာသာဖြင့် ရေးသားပေးပါ။\n\
- {}\n\
- သင်၏ တွေးခေါ်ပုံကို မဖော်ပြဘဲ နောက်ဆုံး content ကိုသာ ပြန်ပေးပါ။",
            LOANWORD_RULE
        ),
    }
}
