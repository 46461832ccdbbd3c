use leptos::prelude::*;

use crate::components::force_graph::{GraphNode, Strength};

/// How far one click on "Closer" / "Further" moves a strength.
pub const STEP: Strength = 10;

/// Detail card for the selected friend.
///
/// `index` is the relationship's position in the strength sequence, `None`
/// for the root (which has no relationship to itself).
#[component]
pub fn FriendPanel(
	friend: GraphNode,
	index: Option<usize>,
	#[prop(into)] strength: Signal<Option<Strength>>,
	#[prop(into)] on_adjust: Callback<(usize, Strength)>,
	#[prop(into)] on_remove: Callback<String>,
	#[prop(into)] on_close: Callback<()>,
) -> impl IntoView {
	let name = friend.label.clone().unwrap_or_else(|| friend.id.clone());
	let id = friend.id;
	let adjust = move |delta: Strength| {
		if let Some(i) = index {
			on_adjust.run((i, delta));
		}
	};
	let closeness = move || {
		strength
			.get()
			.map(|s| s.to_string())
			.unwrap_or_else(|| "-".into())
	};

	view! {
		<aside class="friend-panel">
			<button class="close" on:click=move |_| on_close.run(())>"×"</button>
			<h2>{name}</h2>
			<p class="strength">"Closeness: " {closeness}</p>
			<div class="actions">
				<button disabled=index.is_none() on:click=move |_| adjust(STEP)>
					"Closer"
				</button>
				<button disabled=index.is_none() on:click=move |_| adjust(-STEP)>
					"Further"
				</button>
				<button
					class="danger"
					disabled=index.is_none()
					on:click=move |_| on_remove.run(id.clone())
				>
					"Remove"
				</button>
			</div>
		</aside>
	}
}
