use leptos::prelude::*;

use crate::components::force_graph::DependencyGraph;
use crate::graph::{Edge, EdgeKind, GraphData, Node, NodeKind};

/// A small class hierarchy shown when no editor host sends data.
fn demo_graph() -> GraphData {
	let class = |id: &str, path: &str, loc: u32| {
		Node::new(id, id.rsplit('.').next().unwrap_or(id))
			.with_kind(NodeKind::Class)
			.with_path(path)
			.with_loc(loc)
	};
	let nodes = vec![
		class("app.Main", "src/app/Main.java", 120),
		class("app.Config", "src/app/Config.java", 60),
		Node::new("core.Service", "Service")
			.with_kind(NodeKind::Interface)
			.with_path("src/core/Service.java")
			.with_loc(20),
		Node::new("core.BaseService", "BaseService")
			.with_kind(NodeKind::AbstractClass)
			.with_path("src/core/BaseService.java")
			.with_loc(90),
		class("core.UserService", "src/core/UserService.java", 240),
		class("core.OrderService", "src/core/OrderService.java", 310),
		class("data.Repository", "src/data/Repository.java", 150),
		class("data.User", "src/data/User.java", 45),
		class("data.Order", "src/data/Order.java", 70),
	];
	let links = vec![
		Edge::new("app.Main", "app.Config", EdgeKind::ObjectCreate),
		Edge::new("app.Main", "core.UserService", EdgeKind::ObjectCreate),
		Edge::new("app.Main", "core.OrderService", EdgeKind::ObjectCreate),
		Edge::new("core.BaseService", "core.Service", EdgeKind::Implements),
		Edge::new("core.UserService", "core.BaseService", EdgeKind::Extends),
		Edge::new("core.OrderService", "core.BaseService", EdgeKind::Extends),
		Edge::new("core.BaseService", "data.Repository", EdgeKind::TypeUse),
		Edge::new("core.UserService", "data.User", EdgeKind::TypeUse),
		Edge::new("core.OrderService", "data.Order", EdgeKind::TypeUse),
		Edge::new("core.OrderService", "core.UserService", EdgeKind::MethodCall),
		Edge::new("data.Order", "data.User", EdgeKind::TypeUse),
	];
	GraphData { nodes, links }
}

/// Full-window dependency graph.
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<DependencyGraph demo=Some(demo_graph()) fullscreen=true />
				<div class="graph-overlay">
					<h1>"Dependencies"</h1>
					<p class="subtitle">"Click a node to open it. Drag to pan, scroll to zoom."</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
