//! Prompt and system-instruction text for every inference call.
//!
//! All model-facing text is Brazilian Portuguese, the language of the
//! project documents and of the generated outputs.

use std::fmt::Write as _;

use reqminer_shared::Topic;

/// Exact answer the model is told to give when a chunk has nothing to extract.
pub const NO_INFO_SENTINEL: &str = "Nenhuma informação técnica relevante.";

/// Characters of the consolidated document shown to the summary call.
pub const SUMMARY_CONTEXT_CHARS: usize = 2000;

/// Template the executive summary must follow.
pub const SUMMARY_TEMPLATE: &str = "Resumo dos documentos analisados, após analisar a documentação \
na base de conhecimento, entendo que a necessidade do cliente [NOME DO CLIENTE], é resolver o \
problema de '[PROBLEMA PRINCIPAL]' de sua loja/empresa.";

/// Section headers of the consolidated document, in output order.
pub const CONSOLIDATED_SECTIONS: [&str; 4] = [
    "## 1. Regras de Negócio",
    "## 2. Requisitos Funcionais",
    "## 3. Requisitos Não Funcionais",
    "## 4. Premissas e Restrições",
];

const EXTRACTION_PERSONA: &str = "Você é um profissional de extração técnica, especializado em \
identificar requisitos e fatos técnicos em documentação de projetos.\n\
Sua missão é extrair apenas fatos e requisitos técnicos.";

const CONSOLIDATION_PERSONA: &str = "Você é um Engenheiro de Requisitos Sênior responsável por \
consolidar documentação de múltiplos arquivos.";

/// System instruction for per-chunk extraction: persona, profile orientation,
/// then the fixed rules.
pub fn extraction_system_instruction(orientation: &str) -> String {
    let mut system = String::from(EXTRACTION_PERSONA);

    let orientation = orientation.trim();
    if !orientation.is_empty() {
        system.push_str("\n\nORIENTAÇÃO ESPECÍFICA:\n");
        system.push_str(orientation);
    }

    system.push_str("\n\nREGRAS CRÍTICAS:\n");
    system.push_str("1. Responda APENAS em Português Brasileiro.\n");
    system.push_str("2. NÃO adicione opiniões ou interpretações.\n");
    system.push_str("3. NÃO invente informações.\n");
    let _ = write!(
        system,
        "4. Se o trecho não contiver informações aplicáveis, responda exatamente: \"{NO_INFO_SENTINEL}\""
    );
    system
}

/// Per-chunk prompt: topic-driven when the profile has topics, otherwise the
/// four fixed categories.
pub fn extraction_prompt(topics: &[Topic], chunk_text: &str) -> String {
    if topics.is_empty() {
        generic_extraction_prompt(chunk_text)
    } else {
        topic_extraction_prompt(topics, chunk_text)
    }
}

fn generic_extraction_prompt(chunk_text: &str) -> String {
    format!(
        "Extraia do texto abaixo:\n\
         - Regras de Negócio\n\
         - Requisitos Funcionais (o que o sistema faz)\n\
         - Requisitos Não Funcionais (qualidade, performance, segurança)\n\
         - Premissas e Restrições\n\
         \n\
         TEXTO:\n\
         <<<\n\
         {chunk_text}\n\
         >>>\n"
    )
}

fn topic_extraction_prompt(topics: &[Topic], chunk_text: &str) -> String {
    let mut prompt = String::from(
        "Extraia do texto abaixo as informações relevantes para cada um dos tópicos a seguir.\n\
         Organize a resposta por tópico e omita os tópicos sem informação no texto.\n\
         \n\
         TÓPICOS:\n",
    );
    for topic in topics {
        prompt.push_str("- ");
        prompt.push_str(topic.name.trim());
        prompt.push('\n');
    }
    prompt.push_str("\nTEXTO:\n<<<\n");
    prompt.push_str(chunk_text);
    prompt.push_str("\n>>>\n");
    prompt
}

/// System instruction shared by the consolidation and summary calls.
pub fn consolidation_system_instruction() -> &'static str {
    CONSOLIDATION_PERSONA
}

/// Prompt merging every extraction into one categorized document.
pub fn consolidation_prompt(extractions: &[&str]) -> String {
    let mut prompt = String::from(
        "Consolide as seguintes extrações técnicas em um único documento estruturado.\n\
         Remova duplicatas e organize por categorias.\n\
         \n\
         EXTRAÇÕES:\n",
    );
    prompt.push_str(&extractions.join("\n"));
    prompt.push_str("\n\nSAÍDA ESTRUTURADA (Markdown):\n");
    for section in CONSOLIDATED_SECTIONS {
        prompt.push_str(section);
        prompt.push('\n');
    }
    prompt
}

/// Prompt asking for the fixed-template executive summary over the start of
/// the consolidated document.
pub fn summary_prompt(consolidated: &str) -> String {
    format!(
        "Baseado na análise consolidada abaixo, gere um resumo curto de entendimento.\n\
         Use EXATAMENTE este formato:\n\
         \"{SUMMARY_TEMPLATE}\"\n\
         \n\
         ANÁLISE:\n\
         {}\n",
        char_prefix(consolidated, SUMMARY_CONTEXT_CHARS)
    )
}

/// The first `max_chars` characters of `text`, never splitting a character.
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
