//! Batched loader that expands species into their pokemon forms.

use tokio_util::sync::CancellationToken;

use crate::api::{fetch_record, Fetch, ResourceKind};
use crate::collection::SeenIdentitySet;
use crate::models::{GroupedResult, IndexEntry, Pokemon, Species};

/// One batch of groups plus the offset to resume from.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPage {
    pub groups: Vec<GroupedResult<Pokemon>>,
    /// Offset immediately after the last species examined.
    pub next_offset: usize,
}

impl GroupPage {
    pub fn member_count(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum()
    }
}

/// Walk `index` (species entries) in array order from `start_offset` until
/// `target_member_count` new forms have been materialized or the index runs out.
///
/// Forms whose name is already in `seen` are neither fetched nor counted, and a
/// species left with no forms produces no group. A form is added to `seen`
/// before its fetch, so one that fails is skipped here and never requested
/// again. The offset advances past every species examined either way. The
/// caller has reached the end when `next_offset >= index.len()`, regardless
/// of whether the page is empty.
pub async fn load_groups<F: Fetch + ?Sized>(
    fetch: &F,
    index: &[IndexEntry],
    start_offset: usize,
    target_member_count: usize,
    seen: &mut SeenIdentitySet,
) -> GroupPage {
    let never = CancellationToken::new();
    load_groups_until(fetch, index, start_offset, target_member_count, seen, &never).await
}

/// [`load_groups`] that also stops before the next species once `cancel` fires.
pub async fn load_groups_until<F: Fetch + ?Sized>(
    fetch: &F,
    index: &[IndexEntry],
    start_offset: usize,
    target_member_count: usize,
    seen: &mut SeenIdentitySet,
    cancel: &CancellationToken,
) -> GroupPage {
    let target = target_member_count.max(1);
    let mut offset = start_offset.min(index.len());
    let mut materialized = 0usize;
    let mut groups = Vec::new();

    while offset < index.len() && materialized < target {
        if cancel.is_cancelled() {
            tracing::debug!(offset, "group batch cancelled");
            break;
        }
        let parent = &index[offset];
        offset += 1;

        let species: Species = match fetch_record(fetch, &parent.url).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(
                    species = %parent.name,
                    id = parent.id_for(ResourceKind::PokemonSpecies),
                    error = %e,
                    "skipping species"
                );
                continue;
            }
        };

        let mut members: Vec<Pokemon> = Vec::new();
        for variety in &species.varieties {
            let form = &variety.pokemon;
            if !seen.insert(form.name.clone()) {
                continue;
            }
            match fetch_record::<Pokemon, _>(fetch, &form.url).await {
                Ok(pokemon) => {
                    if pokemon.name != form.name {
                        seen.insert(pokemon.name.clone());
                    }
                    members.push(pokemon);
                    materialized += 1;
                }
                Err(e) => {
                    tracing::warn!(form = %form.name, url = %form.url, error = %e, "skipping form");
                }
            }
        }

        if members.is_empty() {
            continue;
        }
        members.sort_by_key(|m| m.id);
        groups.push(GroupedResult {
            group_id: species.id,
            group_name: species.name,
            members,
        });
    }

    groups.sort_by_key(|g| g.sort_key());
    tracing::debug!(
        start_offset,
        next_offset = offset,
        groups = groups.len(),
        materialized,
        "group batch loaded"
    );

    GroupPage {
        groups,
        next_offset: offset,
    }
}
