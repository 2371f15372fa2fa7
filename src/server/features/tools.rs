//! General-purpose demo tools.
//!
//! Each tool is a unit struct implementing [`CapabilityHandler`]; its
//! argument shape lives next to it in a `record()` constructor.

use chrono::Timelike;
use rand::Rng;
use std::collections::HashMap;

use crate::capability::{
    ArgumentShape, CapabilityHandler, CapabilityRecord, FieldSpec, HandlerOutput, HandlerResult,
    Registry, ValidatedArguments,
};
use crate::error::{HandlerError, RegistryError};

/// Register the general tools, in listing order
pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(CalculateTool::record()?)?;
    registry.register(TextUtilsTool::record()?)?;
    registry.register(GreetingTool::record()?)?;
    registry.register(TextAnalyzerTool::record()?)?;
    registry.register(RandomGeneratorTool::record()?)?;
    Ok(())
}

/// Round to `places` decimals; Display drops trailing zeros.
///
/// Values too large to scale are already whole and come back unrounded.
/// Negative zero is folded into zero.
fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let scaled = value * factor;
    let rounded = if scaled.is_finite() {
        scaled.round() / factor
    } else {
        value
    };
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Basic arithmetic
pub struct CalculateTool;

impl CalculateTool {
    pub fn record() -> Result<CapabilityRecord, RegistryError> {
        let shape = ArgumentShape::from_fields(vec![
            FieldSpec::enumeration("operation", &["add", "subtract", "multiply", "divide"])
                .describe("The operation to perform"),
            FieldSpec::number("a").describe("First number"),
            FieldSpec::number("b").describe("Second number"),
            FieldSpec::number("precision")
                .describe("Number of decimal places (0-10)")
                .range(Some(0.0), Some(10.0))
                .with_default(2),
        ])?;
        Ok(CapabilityRecord::tool(
            "calculate",
            "Perform basic arithmetic calculations",
            shape,
            CalculateTool,
        ))
    }
}

#[async_trait::async_trait]
impl CapabilityHandler for CalculateTool {
    async fn handle(&self, args: ValidatedArguments) -> HandlerResult {
        let operation = args.required_str("operation")?;
        let a = args.required_number("a")?;
        let b = args.required_number("b")?;
        let precision = args.number("precision").unwrap_or(2.0).round() as i32;

        let result = match operation {
            "add" => a + b,
            "subtract" => a - b,
            "multiply" => a * b,
            "divide" => {
                if b == 0.0 {
                    return Err(HandlerError::failed("Division by zero is not allowed"));
                }
                a / b
            }
            other => return Err(HandlerError::failed(format!("Unknown operation: {}", other))),
        };

        let rounded = round_to(result, precision);
        if !result.is_finite() || !rounded.is_finite() {
            return Err(HandlerError::failed(format!(
                "Result of {} {} {} is not a finite number",
                a, operation, b
            )));
        }

        Ok(HandlerOutput::text(format!(
            "Result: {} {} {} = {}",
            a, operation, b, rounded
        )))
    }
}

/// String transformations
pub struct TextUtilsTool;

impl TextUtilsTool {
    pub fn record() -> Result<CapabilityRecord, RegistryError> {
        let shape = ArgumentShape::from_fields(vec![
            FieldSpec::enumeration("operation", &["uppercase", "lowercase", "reverse", "count"])
                .describe("The text operation to perform"),
            FieldSpec::string("text").describe("The input text"),
        ])?;
        Ok(CapabilityRecord::tool(
            "text-utils",
            "Perform various text operations",
            shape,
            TextUtilsTool,
        ))
    }
}

#[async_trait::async_trait]
impl CapabilityHandler for TextUtilsTool {
    async fn handle(&self, args: ValidatedArguments) -> HandlerResult {
        let operation = args.required_str("operation")?;
        let text = args.required_str("text")?;

        let result = match operation {
            "uppercase" => text.to_uppercase(),
            "lowercase" => text.to_lowercase(),
            "reverse" => text.chars().rev().collect(),
            "count" => format!(
                "Character count: {}, Word count: {}",
                text.chars().count(),
                text.split_whitespace().count()
            ),
            other => return Err(HandlerError::failed(format!("Unknown operation: {}", other))),
        };

        Ok(HandlerOutput::text(format!(
            "Operation: {}\nInput: \"{}\"\nResult: {}",
            operation, text, result
        )))
    }
}

/// Personalised greetings in four languages
pub struct GreetingTool;

impl GreetingTool {
    pub fn record() -> Result<CapabilityRecord, RegistryError> {
        let shape = ArgumentShape::from_fields(vec![
            FieldSpec::string("name").describe("Name of the person to greet"),
            FieldSpec::enumeration("style", &["formal", "casual", "enthusiastic"])
                .describe("Greeting style")
                .with_default("casual"),
            FieldSpec::enumeration("language", &["english", "spanish", "french", "german"])
                .describe("Greeting language")
                .with_default("english"),
            FieldSpec::boolean("time_aware")
                .describe("Prefix the greeting with the time of day")
                .with_default(false),
            FieldSpec::boolean("detect_mood")
                .describe("Add a playful note about the name")
                .with_default(false),
        ])?;
        Ok(CapabilityRecord::tool(
            "greeting",
            "Create personalized greetings",
            shape,
            GreetingTool,
        ))
    }

    fn template(language: &str, style: &str) -> &'static str {
        match (language, style) {
            ("spanish", "formal") => {
                "Buenos días, {name}. Espero que tengas una experiencia agradable."
            }
            ("spanish", "enthusiastic") => "¡¡HOLA {name}!! ¡Eres INCREÍBLE!",
            ("spanish", _) => "¡Hola {name}! ¡Mucho gusto!",
            ("french", "formal") => {
                "Bonjour, {name}. J'espère que vous passez une agréable journée."
            }
            ("french", "enthusiastic") => "SALUT {name}! Tu es FANTASTIQUE!",
            ("french", _) => "Salut {name}! Ravi de te rencontrer!",
            ("german", "formal") => {
                "Guten Tag, {name}. Ich hoffe, Sie haben eine angenehme Erfahrung."
            }
            ("german", "enthusiastic") => "HALLO {name}! Du bist GROSSARTIG!",
            ("german", _) => "Hallo {name}! Schön dich kennenzulernen!",
            (_, "formal") => "Good day, {name}. I hope you're having a pleasant experience.",
            (_, "enthusiastic") => "HEY THERE {name}! You're AWESOME!",
            _ => "Hey {name}! Nice to meet you!",
        }
    }

    fn time_prefix(hour: u32) -> &'static str {
        if hour < 12 {
            "Good morning, "
        } else if hour < 17 {
            "Good afternoon, "
        } else {
            "Good evening, "
        }
    }

    /// Whimsical mood guess from the shape of a name
    fn mood(name: &str) -> &'static str {
        let lower: Vec<char> = name.to_lowercase().chars().collect();
        let repeated = lower.windows(2).any(|pair| pair[0] == pair[1]);
        let is_vowel = |c: &char| "aeiou".contains(*c);
        let vowel_run = lower.windows(2).any(|pair| pair.iter().all(is_vowel));

        match lower.len() {
            0..=3 => "short and punchy",
            8.. => "elegant and refined",
            _ if repeated => "fun-loving",
            _ if vowel_run => "harmonious",
            _ => "well-rounded",
        }
    }
}

#[async_trait::async_trait]
impl CapabilityHandler for GreetingTool {
    async fn handle(&self, args: ValidatedArguments) -> HandlerResult {
        let name = args.required_str("name")?.trim();
        if name.is_empty() {
            return Err(HandlerError::failed("Name must not be empty"));
        }
        let style = args.str("style").unwrap_or("casual");
        let language = args.str("language").unwrap_or("english");

        let shown = if style == "enthusiastic" {
            name.to_uppercase()
        } else {
            name.to_string()
        };
        let mut greeting = Self::template(language, style).replace("{name}", &shown);

        if args.boolean("time_aware").unwrap_or(false) {
            let prefix = Self::time_prefix(chrono::Local::now().hour());
            greeting = format!("{}{}", prefix, greeting);
        }
        if args.boolean("detect_mood").unwrap_or(false) {
            greeting.push_str(&format!(
                " (I detect a {} energy from your name!)",
                Self::mood(name)
            ));
        }

        Ok(HandlerOutput::text(greeting))
    }
}

const POSITIVE_WORDS: [&str; 10] = [
    "good", "great", "excellent", "amazing", "wonderful", "fantastic", "love", "happy", "joy",
    "perfect",
];
const NEGATIVE_WORDS: [&str; 10] = [
    "bad", "terrible", "awful", "hate", "sad", "angry", "horrible", "disgusting", "worst",
    "failure",
];

/// Text statistics with optional word frequency and sentiment
pub struct TextAnalyzerTool;

impl TextAnalyzerTool {
    pub fn record() -> Result<CapabilityRecord, RegistryError> {
        let shape = ArgumentShape::from_fields(vec![
            FieldSpec::string("text").describe("Text to analyze"),
            FieldSpec::boolean("include_words")
                .describe("Include word frequency analysis")
                .with_default(false),
            FieldSpec::boolean("include_sentiment")
                .describe("Include basic sentiment analysis")
                .with_default(false),
        ])?;
        Ok(CapabilityRecord::tool(
            "text_analyzer",
            "Analyze text and provide detailed statistics",
            shape,
            TextAnalyzerTool,
        ))
    }

    fn paragraph_count(text: &str) -> usize {
        let mut count = 0;
        let mut in_paragraph = false;
        for line in text.lines() {
            let blank = line.trim().is_empty();
            if !blank && !in_paragraph {
                count += 1;
            }
            in_paragraph = !blank;
        }
        count
    }

    /// Most frequent words longer than two characters, ties by first appearance
    fn top_words(text: &str, limit: usize) -> Vec<(String, usize)> {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
            .collect();

        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, usize> = HashMap::new();
        for word in cleaned.split_whitespace().filter(|w| w.chars().count() > 2) {
            let count = counts.entry(word.to_string()).or_insert(0);
            if *count == 0 {
                order.push(word.to_string());
            }
            *count += 1;
        }

        let mut ranked: Vec<(String, usize)> = order
            .into_iter()
            .map(|word| {
                let count = counts.get(&word).copied().unwrap_or(0);
                (word, count)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(limit);
        ranked
    }
}

#[async_trait::async_trait]
impl CapabilityHandler for TextAnalyzerTool {
    async fn handle(&self, args: ValidatedArguments) -> HandlerResult {
        let text = args.required_str("text")?;
        if text.is_empty() {
            return Err(HandlerError::failed("Text must not be empty"));
        }

        let chars = text.chars().count();
        let non_space = text.chars().filter(|c| !c.is_whitespace()).count();
        let words = text.split_whitespace().count();
        let sentences = text
            .split(|c| matches!(c, '.' | '!' | '?'))
            .filter(|s| !s.trim().is_empty())
            .count();
        let paragraphs = Self::paragraph_count(text);
        let average = if sentences > 0 {
            format!("{:.1}", words as f64 / sentences as f64)
        } else {
            "0".to_string()
        };

        let mut analysis = format!(
            "**Text Analysis Results:**\n\n**Basic Statistics:**\n\
             - Characters: {} ({} without spaces)\n\
             - Words: {}\n\
             - Sentences: {}\n\
             - Paragraphs: {}\n\
             - Average words per sentence: {}",
            chars, non_space, words, sentences, paragraphs, average
        );

        if args.boolean("include_words").unwrap_or(false) && words > 0 {
            analysis.push_str("\n\n**Top 5 Words:**");
            for (index, (word, count)) in Self::top_words(text, 5).iter().enumerate() {
                analysis.push_str(&format!("\n{}. \"{}\" ({} times)", index + 1, word, count));
            }
        }

        if args.boolean("include_sentiment").unwrap_or(false) {
            let lower = text.to_lowercase();
            let positive = POSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
            let negative = NEGATIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
            let sentiment = match positive.cmp(&negative) {
                std::cmp::Ordering::Greater => "Positive",
                std::cmp::Ordering::Less => "Negative",
                std::cmp::Ordering::Equal => "Neutral",
            };
            analysis.push_str(&format!(
                "\n\n**Sentiment Analysis:**\n\
                 - Overall sentiment: {}\n\
                 - Positive indicators: {}\n\
                 - Negative indicators: {}",
                sentiment, positive, negative
            ));
        }

        Ok(HandlerOutput::text(analysis))
    }
}

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Random numbers, strings, passwords, colours and UUIDs
pub struct RandomGeneratorTool;

impl RandomGeneratorTool {
    pub fn record() -> Result<CapabilityRecord, RegistryError> {
        let shape = ArgumentShape::from_fields(vec![
            FieldSpec::enumeration("type", &["number", "string", "password", "color", "uuid"])
                .describe("Type of random data to generate"),
            FieldSpec::number("count")
                .describe("Number of items to generate (1-20)")
                .range(Some(1.0), Some(20.0))
                .with_default(1),
            FieldSpec::number("min")
                .describe("Minimum value (for numbers)")
                .with_default(0),
            FieldSpec::number("max")
                .describe("Maximum value (for numbers)")
                .with_default(100),
            FieldSpec::number("length")
                .describe("Length of string/password (1-100)")
                .range(Some(1.0), Some(100.0))
                .with_default(8),
            FieldSpec::boolean("include_symbols")
                .describe("Include symbols in password")
                .with_default(false),
        ])?;
        Ok(CapabilityRecord::tool(
            "random_generator",
            "Generate various types of random data",
            shape,
            RandomGeneratorTool,
        ))
    }

    fn pick(rng: &mut impl Rng, alphabet: &[u8], length: usize) -> String {
        (0..length)
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
            .collect()
    }

    fn generate(
        kind: &str,
        count: usize,
        bounds: (i64, i64),
        length: usize,
        symbols: bool,
    ) -> Vec<String> {
        let mut rng = rand::thread_rng();
        let mut password_alphabet = [LETTERS, DIGITS].concat();
        if symbols {
            password_alphabet.extend_from_slice(SYMBOLS);
        }

        (0..count)
            .map(|_| match kind {
                "number" => rng.gen_range(bounds.0..=bounds.1).to_string(),
                "string" => Self::pick(&mut rng, LETTERS, length),
                "password" => Self::pick(&mut rng, &password_alphabet, length),
                "color" => {
                    let (r, g, b): (u8, u8, u8) = rng.gen();
                    format!("#{:02x}{:02x}{:02x} (RGB: {}, {}, {})", r, g, b, r, g, b)
                }
                _ => uuid::Uuid::new_v4().to_string(),
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl CapabilityHandler for RandomGeneratorTool {
    async fn handle(&self, args: ValidatedArguments) -> HandlerResult {
        let kind = args.required_str("type")?;
        let count = args.number("count").unwrap_or(1.0).round() as usize;
        let min = args.number("min").unwrap_or(0.0);
        let max = args.number("max").unwrap_or(100.0);
        let length = args.number("length").unwrap_or(8.0).round() as usize;
        let symbols = args.boolean("include_symbols").unwrap_or(false);

        let bounds = (min.ceil() as i64, max.floor() as i64);
        if kind == "number" {
            if min > max {
                return Err(HandlerError::failed(format!(
                    "min ({}) must not be greater than max ({})",
                    min, max
                )));
            }
            if bounds.0 > bounds.1 {
                return Err(HandlerError::failed(format!(
                    "No whole number lies between {} and {}",
                    min, max
                )));
            }
        }

        let results = Self::generate(kind, count, bounds, length, symbols);

        let mut label: String = kind.to_string();
        if let Some(first) = label.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        let mut output = format!(
            "**Random {}{}:**\n\n",
            label,
            if count > 1 { "s" } else { "" }
        );
        if results.len() == 1 {
            output.push_str(&results[0]);
        } else {
            for (index, result) in results.iter().enumerate() {
                output.push_str(&format!("{}. {}\n", index + 1, result));
            }
        }

        match kind {
            "number" => output.push_str(&format!("\n*Range: {} to {}*", min, max)),
            "string" | "password" => output.push_str(&format!(
                "\n*Length: {} characters{}*",
                length,
                if kind == "password" && symbols {
                    " (with symbols)"
                } else {
                    ""
                }
            )),
            _ => {}
        }

        Ok(HandlerOutput::text(output))
    }
}
