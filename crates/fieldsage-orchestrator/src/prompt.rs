//! Prompt assembly for the recommendation call

use crate::evidence::EvidenceSet;
use crate::field_kind::FieldKind;
use fieldsage_domain::{EntityAnchor, FieldDescriptor, LifecycleSlot, UrlCache};

/// Builds the system and user prompts for one batch
pub struct PromptBuilder<'a> {
    fields: &'a [(FieldDescriptor, FieldKind)],
    anchor: Option<&'a EntityAnchor>,
    evidence: Option<&'a EvidenceSet>,
    cache: Option<&'a UrlCache>,
    page_context: Option<&'a str>,
    description_max_chars: usize,
    max_evidence_chars: usize,
}

impl<'a> PromptBuilder<'a> {
    /// Create a builder for the given classified fields
    pub fn new(fields: &'a [(FieldDescriptor, FieldKind)]) -> Self {
        Self {
            fields,
            anchor: None,
            evidence: None,
            cache: None,
            page_context: None,
            description_max_chars: 250,
            max_evidence_chars: 1_500,
        }
    }

    /// Pin every answer to this entity
    pub fn with_anchor(mut self, anchor: Option<&'a EntityAnchor>) -> Self {
        self.anchor = anchor;
        self
    }

    /// Attach gathered evidence
    pub fn with_evidence(mut self, evidence: &'a EvidenceSet) -> Self {
        self.evidence = Some(evidence);
        self
    }

    /// Attach the lifecycle URL cache used by URL fields
    pub fn with_cache(mut self, cache: &'a UrlCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Page title or other context
    pub fn with_page_context(mut self, context: Option<&'a str>) -> Self {
        self.page_context = context.filter(|c| !c.trim().is_empty());
        self
    }

    /// Length limits for descriptions and evidence excerpts
    pub fn with_limits(mut self, description_max_chars: usize, max_evidence_chars: usize) -> Self {
        self.description_max_chars = description_max_chars;
        self.max_evidence_chars = max_evidence_chars;
        self
    }

    /// Build the system prompt
    pub fn build_system(&self) -> String {
        let mut prompt = String::new();

        // 1. Role
        prompt.push_str(ROLE_INSTRUCTIONS);
        prompt.push_str("\n\n");

        // 2. Entity anchor
        match self.anchor {
            Some(anchor) => prompt.push_str(&format!(
                "COMPONENT: \"{anchor}\"\n\
                 Every recommendation must pertain strictly to \"{anchor}\". Do not answer for \
                 other editions, versions, or similarly named products. If the evidence below \
                 describes a different product, say so in the reasoning and lower the confidence.\n\n"
            )),
            None => prompt.push_str(
                "COMPONENT: not confirmed\n\
                 No confirmed component name is available. Do not invent a product identity. \
                 Base suggestions only on the current field values and keep confidence low.\n\n",
            ),
        }

        // 3. Naming convention
        prompt.push_str(NAMING_CONVENTION);
        prompt.push_str("\n\n");

        // 4. Evidence blocks
        if let Some(evidence) = self.evidence.filter(|e| !e.items.is_empty()) {
            prompt.push_str("EVIDENCE GATHERED FROM WEB SEARCH:\n");
            for item in &evidence.items {
                prompt.push_str(&format!(
                    "\n### {} (ID: {}) [{}]\n",
                    item.field_name,
                    item.field_id,
                    item.provenance.tag()
                ));
                prompt.push_str(&truncate(item.text.trim(), self.max_evidence_chars));
                prompt.push('\n');
                if !item.citations.is_empty() {
                    prompt.push_str("Sources:\n");
                    for url in &item.citations {
                        prompt.push_str(&format!("- {}\n", url));
                    }
                }
            }
            prompt.push('\n');
        }

        // 5. Field-type rules for the kinds present in this batch
        prompt.push_str("FIELD RULES:\n");
        prompt.push_str(&self.field_rules());
        prompt.push('\n');

        // 6. Confidence scale and output format
        prompt.push_str(CONFIDENCE_SCALE);
        prompt.push_str("\n\n");
        prompt.push_str(OUTPUT_FORMAT);

        prompt
    }

    /// Build the user prompt listing every field
    pub fn build_user(&self) -> String {
        let mut prompt = String::from(
            "Given the following catalog fields from an IT Component page, provide recommendations:\n\n",
        );
        prompt.push_str(&format!(
            "Page Context: {}\n",
            self.page_context.unwrap_or("IT Component catalog entry")
        ));
        if let Some(anchor) = self.anchor {
            prompt.push_str(&format!("Component: {}\n", anchor));
        }
        prompt.push_str("\nFields to analyze:\n");
        for (field, _) in self.fields {
            if field.is_empty() {
                prompt.push_str(&format!(
                    "- {} (ID: {}): empty\n",
                    field.field_name, field.field_id
                ));
            } else {
                prompt.push_str(&format!(
                    "- {} (ID: {}): current value \"{}\"\n",
                    field.field_name,
                    field.field_id,
                    field.current_value.trim()
                ));
            }
        }
        prompt.push_str(
            "\nProvide one recommendation per field following the rules above. \
             Return ONLY a valid JSON array.",
        );
        prompt
    }

    fn field_rules(&self) -> String {
        let mut rules = String::new();
        let has = |pred: fn(&FieldKind) -> bool| self.fields.iter().any(|(_, k)| pred(k));

        if has(|k| matches!(k, FieldKind::LifecycleDate(_) | FieldKind::Lifecycle)) {
            rules.push_str(
                "- Lifecycle dates: use YYYY-MM-DD. Take the date from the evidence for that field; \
                 if the evidence gives only a month or year, use the first day and say so. \
                 Name the source URL in the reasoning.\n",
            );
        }

        for (field, kind) in self.fields {
            let FieldKind::LifecycleUrl(slot) = kind else {
                continue;
            };
            let cached = self.cache.map(|c| c.urls(*slot)).unwrap_or(&[]);
            match cached.first() {
                Some(url) => rules.push_str(&format!(
                    "- {} (ID: {}): the recommendation MUST be exactly \"{}\", the source already used \
                     for the {}. Do not search for or suggest any other URL.\n",
                    field.field_name,
                    field.field_id,
                    url,
                    slot_label(*slot)
                )),
                None => rules.push_str(&format!(
                    "- {} (ID: {}): no source URL was found for the {}. Return null as the \
                     recommendation; do not invent a URL.\n",
                    field.field_name,
                    field.field_id,
                    slot_label(*slot)
                )),
            }
        }

        if has(|k| matches!(k, FieldKind::Description)) {
            rules.push_str(&format!(
                "- Description: plain factual prose, at most {} characters, no marketing language.\n",
                self.description_max_chars
            ));
        }
        if has(|k| matches!(k, FieldKind::Provider)) {
            rules.push_str(
                "- Provider: the company name only (e.g. \"MongoDB, Inc.\" -> \"MongoDB\"), taken from the evidence.\n",
            );
        }
        if has(|k| matches!(k, FieldKind::Category)) {
            rules.push_str(
                "- Category: a short technology category such as Database, Operating System, \
                 Middleware, Web Server, or Programming Language.\n",
            );
        }
        if has(|k| matches!(k, FieldKind::Website)) {
            rules.push_str("- Website: the vendor's official product homepage URL.\n");
        }
        if has(|k| matches!(k, FieldKind::Name)) {
            rules.push_str(
                "- Name: follow the naming convention exactly; keep the provider, product and version of the component.\n",
            );
        }
        if rules.is_empty() {
            rules.push_str("- Provide appropriate professional values based on the context.\n");
        }
        rules
    }
}

fn slot_label(slot: LifecycleSlot) -> &'static str {
    slot.label()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}

const ROLE_INSTRUCTIONS: &str = "You are an AI assistant specialized in IT catalog management. \
Your job is to suggest values for IT Component catalog fields.";

const NAMING_CONVENTION: &str = r#"NAMING CONVENTION: the Name field always follows
[Provider Name] + [Product Name] + [Version]
Examples:
- "MongoDB Community Server 8.2"
- "Oracle Database Enterprise Edition 19c"
- "Microsoft SQL Server 2022 Standard"
- "Apache Kafka 3.5""#;

const CONFIDENCE_SCALE: &str = r#"CONFIDENCE:
- Value taken from a VERIFIED OFFICIAL SOURCE: 0.85-0.95
- Value taken from a NON-OFFICIAL SOURCE: 0.5-0.7
- No evidence, best guess or unresolved: 0.3-0.4"#;

const OUTPUT_FORMAT: &str = r#"Output format (JSON array only, no additional text):
[
  {
    "fieldId": "the original field ID",
    "fieldName": "the original field name",
    "currentValue": "the current value, or empty",
    "recommendation": "your suggested value, or null",
    "confidence": 0.0-1.0,
    "reasoning": "1-2 sentences; for dates and URLs, name the source URL"
  }
]"#;
