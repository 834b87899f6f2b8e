//! Free-form tags on asset names.

use super::{project_entry, AssetRegistry, ProjectHandle};
use crate::error::{RegistryError, RegistryResult};

impl AssetRegistry {
    /// Attach `tag` to `asset`. `Ok(false)` if the asset already carries it.
    pub fn tag_asset(
        &mut self,
        project: &ProjectHandle,
        asset: &str,
        tag: &str,
    ) -> RegistryResult<bool> {
        let result = self.tag_asset_inner(project, asset, tag);
        self.finish("tag_asset", result)
    }

    fn tag_asset_inner(
        &mut self,
        project: &ProjectHandle,
        asset: &str,
        tag: &str,
    ) -> RegistryResult<bool> {
        let tag = normalize_tag(tag)?;
        let already = self
            .project(project)
            .and_then(|p| p.tags.get(&tag))
            .is_some_and(|assets| assets.iter().any(|a| a == asset));
        if already {
            return Ok(false);
        }

        self.commit(|doc| {
            project_entry(doc, project)?
                .tags
                .entry(tag.clone())
                .or_default()
                .push(asset.to_string());
            Ok(())
        })?;

        tracing::info!(asset, tag = %tag, "Asset tagged");
        Ok(true)
    }

    /// Detach `tag` from `asset`. `Ok(false)` if it was not attached.
    pub fn untag_asset(
        &mut self,
        project: &ProjectHandle,
        asset: &str,
        tag: &str,
    ) -> RegistryResult<bool> {
        let result = self.untag_asset_inner(project, asset, tag);
        self.finish("untag_asset", result)
    }

    fn untag_asset_inner(
        &mut self,
        project: &ProjectHandle,
        asset: &str,
        tag: &str,
    ) -> RegistryResult<bool> {
        let tag = normalize_tag(tag)?;
        let attached = self
            .project(project)
            .and_then(|p| p.tags.get(&tag))
            .is_some_and(|assets| assets.iter().any(|a| a == asset));
        if !attached {
            return Ok(false);
        }

        self.commit(|doc| {
            let tags = &mut project_entry(doc, project)?.tags;
            if let Some(assets) = tags.get_mut(&tag) {
                assets.retain(|a| a != asset);
                if assets.is_empty() {
                    tags.remove(&tag);
                }
            }
            Ok(())
        })?;

        tracing::info!(asset, tag = %tag, "Asset untagged");
        Ok(true)
    }

    /// Asset names carrying `tag`, in tagging order.
    pub fn assets_with_tag(&self, project: &ProjectHandle, tag: &str) -> Vec<String> {
        let tag = tag.trim().to_lowercase();
        self.project(project)
            .and_then(|p| p.tags.get(&tag))
            .cloned()
            .unwrap_or_default()
    }

    /// Tags attached to `asset`, ordered by tag.
    pub fn tags_for_asset(&self, project: &ProjectHandle, asset: &str) -> Vec<String> {
        self.project(project)
            .map(|p| {
                p.tags
                    .iter()
                    .filter(|(_, assets)| assets.iter().any(|a| a == asset))
                    .map(|(tag, _)| tag.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Tags are trimmed and lowercased so `"Hero "` and `"hero"` are one tag.
fn normalize_tag(tag: &str) -> RegistryResult<String> {
    let tag = tag.trim().to_lowercase();
    if tag.is_empty() {
        return Err(RegistryError::Validation("Tag must not be empty".to_string()));
    }
    Ok(tag)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::registry::test_support::Fixture;

    #[test]
    fn tag_and_query_both_directions() {
        let mut fx = Fixture::new();
        assert!(fx.registry.tag_asset(&fx.project, "hero", "Character").unwrap());
        assert!(fx.registry.tag_asset(&fx.project, "hero", "approved").unwrap());
        assert!(fx.registry.tag_asset(&fx.project, "villain", "character").unwrap());

        assert_eq!(
            fx.registry.assets_with_tag(&fx.project, "CHARACTER"),
            vec!["hero", "villain"]
        );
        assert_eq!(
            fx.registry.tags_for_asset(&fx.project, "hero"),
            vec!["approved", "character"]
        );
        assert_eq!(
            fx.reload().assets_library["Demo"].tags["character"],
            vec!["hero", "villain"]
        );
    }

    #[test]
    fn duplicate_tag_is_a_no_op() {
        let mut fx = Fixture::new();
        assert!(fx.registry.tag_asset(&fx.project, "hero", "wip").unwrap());
        assert!(!fx.registry.tag_asset(&fx.project, "hero", " WIP ").unwrap());
        assert_eq!(fx.registry.assets_with_tag(&fx.project, "wip"), vec!["hero"]);
    }

    #[test]
    fn untag_removes_empty_tag() {
        let mut fx = Fixture::new();
        fx.registry.tag_asset(&fx.project, "hero", "wip").unwrap();

        assert!(fx.registry.untag_asset(&fx.project, "hero", "wip").unwrap());
        assert!(!fx.registry.untag_asset(&fx.project, "hero", "wip").unwrap());
        assert!(fx.registry.project(&fx.project).unwrap().tags.is_empty());
    }

    #[test]
    fn empty_tag_is_rejected() {
        let mut fx = Fixture::new();
        assert_matches!(
            fx.registry.tag_asset(&fx.project, "hero", "   "),
            Err(RegistryError::Validation(_))
        );
    }
}
