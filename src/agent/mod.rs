pub mod input_types;
pub mod output_types;
pub mod response_schema;
pub mod system_prompt;
pub mod validation;
pub mod transformers;
pub mod stateless_llm_factory;
pub mod chat_service;

pub mod stateless_llm;

#[cfg(test)]
pub mod testing;
