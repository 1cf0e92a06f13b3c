use tracing::{debug, info};

use crate::capabilities::{CapabilityInvoker, RegistryError};
use crate::llm::provider::{ChatMessage, FunctionCall};

pub async fn dispatch_function_call<C: CapabilityInvoker>(
    capabilities: &C,
    call: &FunctionCall,
) -> Result<ChatMessage, RegistryError> {
    let resolved = capabilities.resolve(call)?;
    info!(function = %call.name, "calling function");
    debug!(function = %call.name, arguments = %call.arguments, "function arguments");

    let result = capabilities.invoke(resolved).await;
    if result.is_error() {
        info!(function = %call.name, "function returned an error result");
    }

    let content = result.to_content();
    debug!(function = %call.name, result = %content, "function result");
    Ok(ChatMessage::function_result(call.name.clone(), content))
}
