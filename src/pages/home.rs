use leptos::prelude::*;
use log::info;

use crate::components::force_graph::{
	ForceGraphCanvas, GraphData, GraphLink, GraphNode, Strength, StrengthController,
};
use crate::components::friend_panel::FriendPanel;

const ROOT_ID: &str = "me";
const NAMES: &[&str] = &[
	"Ada", "Grace", "Linus", "Margaret", "Dennis", "Barbara", "Ken", "Frances", "Alan", "Radia",
];

#[derive(Clone, Debug, PartialEq)]
struct Friend {
	id: String,
	name: String,
	strength: Strength,
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

fn sample_friends() -> Vec<Friend> {
	NAMES
		.iter()
		.enumerate()
		.map(|(i, name)| Friend {
			id: format!("friend-{i}"),
			name: (*name).into(),
			strength: 1 + (rand_simple(i) * 100.0) as Strength,
		})
		.collect()
}

/// The viewing user at index 0, one link per friend in list order.
fn network(friends: &[Friend]) -> GraphData {
	let root = GraphNode::new(ROOT_ID, "You");
	let nodes = std::iter::once(root)
		.chain(friends.iter().enumerate().map(|(i, f)| GraphNode {
			group: Some(i as u32),
			..GraphNode::new(f.id.clone(), f.name.clone())
		}))
		.collect();
	let links = friends
		.iter()
		.map(|f| GraphLink::new(ROOT_ID, f.id.clone()))
		.collect();
	GraphData { nodes, links }
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let friends = RwSignal::new(sample_friends());
	let controller = RwSignal::new(StrengthController::new(
		friends.with_untracked(|f| f.iter().map(|x| x.strength).collect::<Vec<_>>()),
	));
	let data = Memo::new(move |_| friends.with(|f| network(f)));
	let strengths = Signal::derive(move || controller.with(|c| c.strengths().clone()));
	let selected = RwSignal::new(None::<GraphNode>);

	let on_adjust = move |(index, delta): (usize, Strength)| {
		controller.update(|c| {
			c.adjust(index, delta);
		});
	};

	// Removing a relationship replaces the dataset and the strength sequence
	// together; the remaining strengths keep their current values.
	let on_remove = move |id: String| {
		let current = controller.with_untracked(|c| c.strengths().clone());
		let mut kept = friends.get_untracked();
		for (friend, &strength) in kept.iter_mut().zip(current.iter()) {
			friend.strength = strength;
		}
		kept.retain(|f| f.id != id);
		info!("removing relationship {id}");
		controller.set(StrengthController::new(
			kept.iter().map(|f| f.strength).collect::<Vec<_>>(),
		));
		friends.set(kept);
		selected.set(None);
	};

	let panel = move || {
		selected.get().map(|friend| {
			let index = friends.with_untracked(|f| f.iter().position(|x| x.id == friend.id));
			let strength = Signal::derive(move || index.and_then(|i| strengths.get().get(i).copied()));
			view! {
				<FriendPanel
					friend=friend
					index=index
					strength=strength
					on_adjust=on_adjust
					on_remove=on_remove
					on_close=move |_: ()| selected.set(None)
				/>
			}
		})
	};

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
				<ForceGraphCanvas
					data=data
					strengths=strengths
					on_select=move |node: GraphNode| selected.set(Some(node))
					fullscreen=true
				/>
				<div class="graph-overlay">
					<h1>"Your Network"</h1>
					<p class="subtitle">
						"Click a friend to bring them closer. Drag to move, scroll to zoom, drag the background to pan."
					</p>
				</div>
				{panel}
			</div>
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sample_strengths_are_user_settable() {
		for friend in sample_friends() {
			assert!((1..=100).contains(&friend.strength), "{friend:?}");
		}
	}

	#[test]
	fn network_is_a_star_around_the_user() {
		let friends = sample_friends();
		let data = network(&friends);
		assert_eq!(data.root().map(|n| n.id.as_str()), Some(ROOT_ID));
		assert_eq!(data.links.len(), friends.len());
		assert!(data.links.iter().all(|l| l.source == ROOT_ID));
		assert_eq!(data.validate(), Ok(()));
	}
}
