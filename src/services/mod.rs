pub(crate) mod gateway;
pub(crate) mod gemini_client;
pub(crate) mod ollama_client;
pub(crate) mod openai_client;
pub(crate) mod prompt;
pub(crate) mod response_parser;
