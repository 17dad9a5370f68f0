//! GitHub-release fallback recipes and latest-version lookup.
//!
//! When a requested binary version is in no known artifact, a recipe for
//! the matching `gfbuild-<project>` release asset is synthesized from the
//! descriptor alone. The naming scheme is fixed per project; two projects
//! deviate from it (the graphicsfuzz tool bundle and the amber APK pair)
//! and are special-cased.

use crate::builtin::{self, BUILT_IN_PREFIX};
use crate::error::BinaryError;
use prism_artifact::{Archive, ArchiveSet, ArtifactPath, Binary, Recipe};
use prism_common::Platform;
use serde::Deserialize;

/// Maps a binary name to the release project that publishes it.
pub fn project_for_binary(name: &str) -> Result<&'static str, BinaryError> {
    let project = match name {
        "glslangValidator" => "glslang",
        "spirv-opt" | "spirv-as" | "spirv-dis" | "spirv-val" | "spirv-fuzz" | "spirv-reduce" => {
            "SPIRV-Tools"
        }
        "swift_shader_icd" => "swiftshader",
        "amber" | "amber_apk" | "amber_apk_test" => "amber",
        "graphicsfuzz-tool" => "graphicsfuzz",
        "amdllpc" => "llpc",
        _ => {
            return Err(BinaryError::NoProjectForBinary {
                name: name.to_string(),
            })
        }
    };
    Ok(project)
}

/// The platform tag carried by the descriptor, or the host platform when
/// the descriptor does not pin one.
fn platform_from_tags(binary: &Binary) -> Result<String, BinaryError> {
    let platforms: Vec<&String> = binary
        .tags
        .iter()
        .filter(|t| Platform::from_tag(t).is_some())
        .collect();
    match platforms.as_slice() {
        [] => Ok(Platform::host().tag().to_string()),
        [one] => Ok((*one).clone()),
        _ => Err(BinaryError::AmbiguousPlatform {
            name: binary.name.clone(),
            tags: binary.tags.clone(),
        }),
    }
}

/// The single build-config tag (`Release` or `Debug`) from the descriptor.
fn config_from_tags(binary: &Binary) -> Result<String, BinaryError> {
    let configs: Vec<&String> = binary
        .tags
        .iter()
        .filter(|t| *t == "Release" || *t == "Debug")
        .collect();
    match configs.as_slice() {
        [one] => Ok((*one).clone()),
        _ => Err(BinaryError::AmbiguousConfig {
            name: binary.name.clone(),
            tags: binary.tags.clone(),
        }),
    }
}

fn all_platform_tags() -> Vec<String> {
    Platform::all().iter().map(|p| p.tag().to_string()).collect()
}

/// Synthesizes the recipe for the release asset that provides `binary`.
///
/// The returned artifact path encodes the asset name, so the same request
/// always lands on the same artifact directory.
pub fn github_release_recipe(binary: &Binary) -> Result<(ArtifactPath, Recipe), BinaryError> {
    let project = project_for_binary(&binary.name)?;
    let version = &binary.version;

    let (platform, tags, repo, asset_name) = if project == "graphicsfuzz" {
        // The graphicsfuzz bundle is a single platform-independent asset.
        (
            Platform::host().tag().to_string(),
            all_platform_tags(),
            format!("gfbuild-{project}"),
            format!("gfbuild-{project}-{version}"),
        )
    } else if binary.name == "amber_apk" || binary.name == "amber_apk_test" {
        // The APK pair is one Android asset, usable from any host.
        let mut tags = all_platform_tags();
        tags.push("Debug".to_string());
        (
            Platform::host().tag().to_string(),
            tags,
            format!("gfbuild-{project}"),
            format!("gfbuild-{project}-{version}-android_apk"),
        )
    } else {
        let platform = platform_from_tags(binary)?;
        let config = config_from_tags(binary)?;
        let arch = "x64";
        let tags = vec![platform.clone(), config.clone(), arch.to_string()];
        (
            platform.clone(),
            tags,
            format!("gfbuild-{project}"),
            format!("gfbuild-{project}-{version}-{platform}_{arch}_{config}"),
        )
    };

    let exe = if platform == "Windows" { ".exe" } else { "" };
    let mk = |name: &str, path: String| Binary {
        name: name.to_string(),
        version: version.clone(),
        tags: tags.clone(),
        path,
    };

    let binaries = match project {
        "glslang" => vec![mk(
            "glslangValidator",
            format!("{project}/bin/glslangValidator{exe}"),
        )],
        "SPIRV-Tools" => [
            "spirv-opt",
            "spirv-as",
            "spirv-dis",
            "spirv-val",
            "spirv-fuzz",
            "spirv-reduce",
        ]
        .iter()
        .map(|tool| mk(tool, format!("{project}/bin/{tool}{exe}")))
        .collect(),
        "swiftshader" => vec![mk(
            "swift_shader_icd",
            format!("{project}/lib/vk_swiftshader_icd.json"),
        )],
        "amber" => {
            if binary.name == "amber_apk" || binary.name == "amber_apk_test" {
                vec![
                    mk("amber_apk", format!("{project}/amber.apk")),
                    mk("amber_apk_test", format!("{project}/amber-test.apk")),
                ]
            } else {
                vec![mk("amber", format!("{project}/bin/amber{exe}"))]
            }
        }
        "graphicsfuzz" => vec![mk(
            "graphicsfuzz-tool",
            format!("{project}/python/drivers/graphicsfuzz-tool"),
        )],
        "llpc" => {
            if platform != "Linux" {
                return Err(BinaryError::PlatformUnsupported {
                    name: binary.name.clone(),
                    platform,
                });
            }
            vec![mk("amdllpc", format!("{project}/bin/amdllpc{exe}"))]
        }
        _ => {
            return Err(BinaryError::NoProjectForBinary {
                name: binary.name.clone(),
            })
        }
    };

    let artifact_path = ArtifactPath::new(format!("{BUILT_IN_PREFIX}/{asset_name}"))?;
    let recipe = Recipe::DownloadAndExtractArchiveSet {
        archive_set: ArchiveSet {
            archives: vec![Archive {
                url: format!(
                    "https://github.com/google/{repo}/releases/download/github/google/{repo}/{version}/{asset_name}.zip"
                ),
                output_file: format!("{project}.zip"),
                output_directory: project.to_string(),
            }],
            binaries,
        },
    };
    Ok((artifact_path, recipe))
}

/// One release from the listing API; only the fields we read.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// The release tag, ending in `/<version>`.
    pub tag_name: String,
    /// Uploaded assets; only the count is inspected.
    #[serde(default)]
    pub assets: Vec<serde_json::Value>,
}

/// Lists the releases of a `gfbuild-<project>` repository, newest first.
pub trait ReleaseLister {
    /// Fetches the release listing for `project`.
    fn list_releases(&self, project: &str) -> Result<Vec<Release>, BinaryError>;
}

/// Production lister backed by the GitHub API.
pub struct GithubReleaseLister {
    client: reqwest::blocking::Client,
}

impl GithubReleaseLister {
    /// Builds a lister with a `prism/<version>` user agent, which the
    /// GitHub API requires.
    pub fn new() -> Result<Self, BinaryError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("prism/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BinaryError::DownloadVersion {
                project: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl ReleaseLister for GithubReleaseLister {
    fn list_releases(&self, project: &str) -> Result<Vec<Release>, BinaryError> {
        let url = format!("https://api.github.com/repos/google/gfbuild-{project}/releases");
        tracing::info!("checking {url}");
        let fail = |reason: String| BinaryError::DownloadVersion {
            project: project.to_string(),
            reason,
        };
        self.client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| fail(e.to_string()))?
            .json()
            .map_err(|e| fail(e.to_string()))
    }
}

/// The asset count of a complete release, per project. Releases with a
/// different count are still uploading (or failed) and are skipped.
fn expected_asset_count(project: &str) -> Result<usize, BinaryError> {
    match project {
        "amber" => Ok(19),
        "glslang" => Ok(15),
        "SPIRV-Tools" => Ok(15),
        "swiftshader" => Ok(15),
        "graphicsfuzz" => Ok(5),
        "llpc" => Ok(7),
        _ => Err(BinaryError::DownloadVersion {
            project: project.to_string(),
            reason: "no expected asset count for project".to_string(),
        }),
    }
}

/// Finds the newest complete release of `project` and returns its version.
pub fn latest_version_number(
    project: &str,
    lister: &dyn ReleaseLister,
) -> Result<String, BinaryError> {
    let expected = expected_asset_count(project)?;
    let releases = lister.list_releases(project)?;

    for release in &releases {
        if release.assets.len() != expected {
            tracing::info!(
                "skipping a release of {project} with {} assets (expected {expected})",
                release.assets.len()
            );
            continue;
        }
        let Some(last_slash) = release.tag_name.rfind('/') else {
            return Err(BinaryError::DownloadVersion {
                project: project.to_string(),
                reason: format!("malformed tag name {:?}", release.tag_name),
            });
        };
        let version = &release.tag_name[last_slash + 1..];
        tracing::info!("found {project} version {version}");
        return Ok(version.to_string());
    }

    Err(BinaryError::DownloadVersion {
        project: project.to_string(),
        reason: format!("no release with {expected} assets"),
    })
}

/// Returns the default binary list with every version replaced by the
/// newest complete release of its project.
pub fn latest_default_binaries(lister: &dyn ReleaseLister) -> Result<Vec<Binary>, BinaryError> {
    tracing::info!("downloading the latest binary version numbers");
    let mut binaries = builtin::default_binaries();
    for binary in &mut binaries {
        let project = project_for_binary(&binary.name)?;
        binary.version = latest_version_number(project, lister)?;
    }
    Ok(binaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, version: &str, tags: &[&str]) -> Binary {
        Binary {
            name: name.to_string(),
            version: version.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            path: String::new(),
        }
    }

    #[test]
    fn normal_release_recipe() {
        let (path, recipe) =
            github_release_recipe(&request("spirv-opt", "deadbeef", &["Linux", "Debug"])).unwrap();
        assert_eq!(
            path.as_str(),
            "//binaries/built_in/gfbuild-SPIRV-Tools-deadbeef-Linux_x64_Debug"
        );
        let Recipe::DownloadAndExtractArchiveSet { archive_set } = recipe;
        assert_eq!(
            archive_set.archives[0].url,
            "https://github.com/google/gfbuild-SPIRV-Tools/releases/download/github/google/gfbuild-SPIRV-Tools/deadbeef/gfbuild-SPIRV-Tools-deadbeef-Linux_x64_Debug.zip"
        );
        // Sibling tools come along for free.
        assert_eq!(archive_set.binaries.len(), 6);
        let opt = archive_set
            .binaries
            .iter()
            .find(|b| b.name == "spirv-opt")
            .unwrap();
        assert_eq!(opt.path, "SPIRV-Tools/bin/spirv-opt");
        assert_eq!(opt.tags, vec!["Linux", "Debug", "x64"]);
    }

    #[test]
    fn windows_release_gets_exe_suffix() {
        let (_, recipe) = github_release_recipe(&request(
            "glslangValidator",
            "v",
            &["Windows", "Release"],
        ))
        .unwrap();
        let Recipe::DownloadAndExtractArchiveSet { archive_set } = recipe;
        assert_eq!(archive_set.binaries[0].path, "glslang/bin/glslangValidator.exe");
    }

    #[test]
    fn graphicsfuzz_bundle_is_platform_independent() {
        let (path, recipe) =
            github_release_recipe(&request("graphicsfuzz-tool", "v123", &[])).unwrap();
        assert_eq!(
            path.as_str(),
            "//binaries/built_in/gfbuild-graphicsfuzz-v123"
        );
        let Recipe::DownloadAndExtractArchiveSet { archive_set } = recipe;
        let tool = &archive_set.binaries[0];
        assert_eq!(tool.path, "graphicsfuzz/python/drivers/graphicsfuzz-tool");
        for platform in ["Linux", "Mac", "Windows"] {
            assert!(tool.tags.iter().any(|t| t == platform));
        }
    }

    #[test]
    fn amber_apk_recipe_provides_the_pair() {
        let (path, recipe) =
            github_release_recipe(&request("amber_apk", "v", &["Debug"])).unwrap();
        assert_eq!(
            path.as_str(),
            "//binaries/built_in/gfbuild-amber-v-android_apk"
        );
        let Recipe::DownloadAndExtractArchiveSet { archive_set } = recipe;
        let names: Vec<&str> = archive_set.binaries.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["amber_apk", "amber_apk_test"]);
        assert_eq!(archive_set.binaries[1].path, "amber/amber-test.apk");
    }

    #[test]
    fn amdllpc_is_linux_only() {
        let err = github_release_recipe(&request("amdllpc", "v", &["Windows", "Debug"]))
            .unwrap_err();
        assert!(matches!(err, BinaryError::PlatformUnsupported { .. }));
    }

    #[test]
    fn unknown_binary_has_no_project() {
        assert!(matches!(
            github_release_recipe(&request("mystery-tool", "v", &["Debug"])),
            Err(BinaryError::NoProjectForBinary { .. })
        ));
    }

    #[test]
    fn config_tag_is_required() {
        assert!(matches!(
            github_release_recipe(&request("spirv-opt", "v", &["Linux"])),
            Err(BinaryError::AmbiguousConfig { .. })
        ));
        assert!(matches!(
            github_release_recipe(&request("spirv-opt", "v", &["Linux", "Debug", "Release"])),
            Err(BinaryError::AmbiguousConfig { .. })
        ));
    }

    struct CannedLister {
        releases: Vec<Release>,
    }

    impl ReleaseLister for CannedLister {
        fn list_releases(&self, _project: &str) -> Result<Vec<Release>, BinaryError> {
            Ok(self.releases.clone())
        }
    }

    fn release(tag: &str, asset_count: usize) -> Release {
        Release {
            tag_name: tag.to_string(),
            assets: vec![serde_json::Value::Null; asset_count],
        }
    }

    #[test]
    fn latest_version_skips_incomplete_releases() {
        let lister = CannedLister {
            releases: vec![
                release("github/google/gfbuild-glslang/new_hash", 3),
                release("github/google/gfbuild-glslang/good_hash", 15),
            ],
        };
        assert_eq!(
            latest_version_number("glslang", &lister).unwrap(),
            "good_hash"
        );
    }

    #[test]
    fn latest_version_rejects_malformed_tag() {
        let lister = CannedLister {
            releases: vec![release("no-slashes-here", 15)],
        };
        assert!(matches!(
            latest_version_number("glslang", &lister),
            Err(BinaryError::DownloadVersion { .. })
        ));
    }

    #[test]
    fn latest_version_fails_when_nothing_qualifies() {
        let lister = CannedLister { releases: vec![] };
        assert!(matches!(
            latest_version_number("llpc", &lister),
            Err(BinaryError::DownloadVersion { .. })
        ));
    }
}
