//! Catalog of upstream model providers whose API keys the gateway consumes.
//!
//! Provider credentials are data, not structure: the descriptor carries a
//! `provider id → value` map, and this catalog only supplies the
//! conventional environment variable name for the well-known ids. Ids not
//! in the catalog are still provisioned, under `{ID}_API_KEY`.

/// A well-known provider and the variable its key is exported as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSpec {
    pub id: &'static str,
    pub env_var: &'static str,
}

pub const PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec { id: "openai", env_var: "OPENAI_API_KEY" },
    ProviderSpec { id: "azure_openai", env_var: "AZURE_OPENAI_API_KEY" },
    ProviderSpec { id: "azure", env_var: "AZURE_API_KEY" },
    ProviderSpec { id: "anthropic", env_var: "ANTHROPIC_API_KEY" },
    ProviderSpec { id: "groq", env_var: "GROQ_API_KEY" },
    ProviderSpec { id: "cohere", env_var: "COHERE_API_KEY" },
    ProviderSpec { id: "co", env_var: "CO_API_KEY" },
    ProviderSpec { id: "hf", env_var: "HF_TOKEN" },
    ProviderSpec { id: "huggingface", env_var: "HUGGINGFACE_API_KEY" },
    ProviderSpec { id: "databricks", env_var: "DATABRICKS_API_KEY" },
    ProviderSpec { id: "gemini", env_var: "GEMINI_API_KEY" },
    ProviderSpec { id: "codestral", env_var: "CODESTRAL_API_KEY" },
    ProviderSpec { id: "mistral", env_var: "MISTRAL_API_KEY" },
    ProviderSpec { id: "azure_ai", env_var: "AZURE_AI_API_KEY" },
    ProviderSpec { id: "nvidia_nim", env_var: "NVIDIA_NIM_API_KEY" },
    ProviderSpec { id: "xai", env_var: "XAI_API_KEY" },
    ProviderSpec { id: "perplexityai", env_var: "PERPLEXITYAI_API_KEY" },
    ProviderSpec { id: "github", env_var: "GITHUB_API_KEY" },
    ProviderSpec { id: "deepseek", env_var: "DEEPSEEK_API_KEY" },
    ProviderSpec { id: "ai21", env_var: "AI21_API_KEY" },
    ProviderSpec { id: "langsmith", env_var: "LANGSMITH_API_KEY" },
];

/// Environment variable name for a provider id.
pub fn env_var_for(id: &str) -> String {
    PROVIDERS
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.env_var.to_string())
        .unwrap_or_else(|| format!("{}_API_KEY", id.to_ascii_uppercase().replace('-', "_")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_ids_and_vars_are_unique() {
        let ids: HashSet<_> = PROVIDERS.iter().map(|p| p.id).collect();
        let vars: HashSet<_> = PROVIDERS.iter().map(|p| p.env_var).collect();
        assert_eq!(ids.len(), PROVIDERS.len());
        assert_eq!(vars.len(), PROVIDERS.len());
    }

    #[test]
    fn env_var_for_known_and_unknown() {
        assert_eq!(env_var_for("hf"), "HF_TOKEN");
        assert_eq!(env_var_for("openai"), "OPENAI_API_KEY");
        assert_eq!(env_var_for("together-ai"), "TOGETHER_AI_API_KEY");
    }
}
