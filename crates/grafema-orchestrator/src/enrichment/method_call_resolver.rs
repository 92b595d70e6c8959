//! Resolves a `METHOD_CALL` to the `METHOD` it actually invokes, once the
//! receiver's inferred class is known. `GraphBuilder` wires `CALLS_ON` from
//! the call to the receiver variable; `InstanceOfResolverPlugin` wires
//! `HAS_TYPE` from that variable to its class, same-module or not. All that
//! is left here is looking up the class's declared method by name.

use crate::context::{Plugin, PluginContext};
use async_trait::async_trait;
use grafema_core::edge::GraphEdge;
use grafema_core::error::Result;
use grafema_core::issue::Issue;
use grafema_core::plugin::{Phase, PluginMetadata};
use grafema_core::types::{EdgeKind, NodeKind};

pub struct MethodCallResolverPlugin;

#[async_trait]
impl Plugin for MethodCallResolverPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("method_call_resolver", Phase::Enrichment, 60).depends_on(["instanceof_resolver"])
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let method_calls = ctx.backend.find_by_type(NodeKind::MethodCall).await?;
        let mut edges = Vec::new();

        for call in &method_calls {
            if ctx.cancellation.is_cancelled() {
                break;
            }
            if !ctx.backend.get_outgoing_edges(&call.id, Some(&[EdgeKind::Invokes])).await?.is_empty() {
                continue;
            }
            let calls_on = ctx.backend.get_outgoing_edges(&call.id, Some(&[EdgeKind::CallsOn])).await?;
            let Some(receiver_edge) = calls_on.first() else { continue };

            let has_type = ctx.backend.get_outgoing_edges(&receiver_edge.dst, Some(&[EdgeKind::HasType])).await?;
            let Some(type_edge) = has_type.first() else { continue };
            let Some(class) = ctx.backend.get_node(&type_edge.dst).await? else { continue };
            if class.kind != NodeKind::Class {
                continue;
            }

            let declares = ctx.backend.get_outgoing_edges(&class.id, Some(&[EdgeKind::Declares])).await?;
            for edge in declares {
                if let Some(method) = ctx.backend.get_node(&edge.dst).await? {
                    if method.kind == NodeKind::Method && method.name == call.name {
                        edges.push(GraphEdge::new(EdgeKind::Invokes, call.id.clone(), method.id.clone()));
                        break;
                    }
                }
            }
        }

        ctx.backend.add_edges(edges, true).await?;
        Ok(Vec::new())
    }
}
