//! Phase 3: Prebuild
//!
//! Architecture-specific preparation, immediately followed by applying the
//! recipe's patches. Both are recorded as a single cached step, so patches
//! are never applied twice to the same build directory.

use log::info;

use super::{BuildRun, Phase};
use crate::arch::Arch;
use crate::error::Result;
use crate::recipe::BuildSteps;

/// Execute Phase 3 for every recipe on `arch`.
pub fn execute(run: &mut BuildRun<'_>, recipes: &[&dyn BuildSteps], arch: &Arch) -> Result<()> {
    info!("# Prebuilding recipes for {}", arch);
    for recipe in recipes {
        run.cached(*recipe, Phase::Prebuild, Some(&arch.name), |ctx| {
            recipe.prebuild(ctx, arch)?;
            recipe.apply_patches(ctx, arch)
        })
        .map_err(|e| e.in_phase(recipe.name(), Phase::Prebuild.as_str(), &arch.name))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::state::StateStore;
    use crate::testing::{test_context, FakeRecipe};

    #[test]
    fn test_phase3_patches_follow_prebuild() {
        let (_temp, ctx) = test_context();
        let mut state = StateStore::open(ctx.state_path()).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let python = FakeRecipe::new("python2", &log);
        let kivy = FakeRecipe::new("kivy", &log);
        let recipes: Vec<&dyn BuildSteps> = vec![&python, &kivy];
        let arch = Arch::from_name("armeabi").unwrap();

        execute(&mut BuildRun::new(&ctx, &mut state, false), &recipes, &arch).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "prebuild:python2:armeabi",
                "patch:python2:armeabi",
                "prebuild:kivy:armeabi",
                "patch:kivy:armeabi",
            ]
        );
        assert!(state.is_done("kivy.prebuild.armeabi"));
    }

    #[test]
    fn test_phase3_failed_patch_not_recorded() {
        let (_temp, ctx) = test_context();
        let mut state = StateStore::open(ctx.state_path()).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let python = FakeRecipe::new("python2", &log).failing_in("patch");
        let recipes: Vec<&dyn BuildSteps> = vec![&python];
        let arch = Arch::from_name("armeabi").unwrap();

        let err = execute(&mut BuildRun::new(&ctx, &mut state, false), &recipes, &arch)
            .unwrap_err();
        assert!(err.to_string().contains("prebuild failed for recipe 'python2' on armeabi"));
        assert!(!state.contains("python2.prebuild.armeabi"));
    }
}
