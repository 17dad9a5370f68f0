//! The built-in binary recipe table.
//!
//! Every pinned tool version that has been used by past fuzzing sessions has
//! a recipe here, keyed by its artifact path, so old sessions remain
//! reproducible without any network metadata. The table is generated from a
//! small set of per-project templates over platform/config suffixes, plus
//! one literal bundle recipe. Version hashes are literal and never change;
//! new versions are appended.

use prism_artifact::{Archive, ArchiveSet, ArtifactPath, Binary, Recipe, RecipeMap};

/// Artifact path prefix under which all binary artifacts live.
pub const BINARY_ARTIFACTS_PREFIX: &str = "//binaries";

/// Artifact path prefix for recipes from this built-in table.
pub const BUILT_IN_PREFIX: &str = "//binaries/built_in";

/// Artifact path prefix reserved for user-provided binary recipes.
pub const CUSTOM_PREFIX: &str = "//binaries/custom";

/// Binary name of the GLSL reference compiler.
pub const GLSLANG_VALIDATOR_NAME: &str = "glslangValidator";
/// Binary name of the SPIR-V optimizer.
pub const SPIRV_OPT_NAME: &str = "spirv-opt";
/// Binary name of the SPIR-V validator.
pub const SPIRV_VAL_NAME: &str = "spirv-val";
/// Binary name of the SPIR-V disassembler.
pub const SPIRV_DIS_NAME: &str = "spirv-dis";
/// Binary name of the SwiftShader Vulkan ICD manifest.
pub const SWIFT_SHADER_NAME: &str = "swift_shader_icd";
/// Binary name of the Amber test runner.
pub const AMBER_NAME: &str = "amber";

/// Tag marking a spirv-opt build that must not run with
/// `--validate-after-all`.
pub const SPIRV_OPT_NO_VALIDATE_AFTER_ALL_TAG: &str = "no-validate-after-all";

/// The SPIRV-Tools version used by default binaries.
pub const DEFAULT_SPIRV_TOOLS_VERSION: &str = "983b5b4fccea17cab053de24d51403efb4829158";

const PLATFORM_SUFFIXES_RELEASE: &[&str] =
    &["Linux_x64_Release", "Windows_x64_Release", "Mac_x64_Release"];
const PLATFORM_SUFFIXES_DEBUG: &[&str] =
    &["Linux_x64_Debug", "Windows_x64_Debug", "Mac_x64_Debug"];
const PLATFORM_SUFFIXES_RELWITHDEBINFO: &[&str] = &[
    "Linux_x64_RelWithDebInfo",
    "Windows_x64_RelWithDebInfo",
    "Mac_x64_RelWithDebInfo",
];

fn binary(name: &str, tags: &[&str], version: &str) -> Binary {
    Binary {
        name: name.to_string(),
        version: version.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        path: String::new(),
    }
}

/// The default binary name/version/tag list for new fuzzing sessions.
///
/// Settings can pin different versions; these are the fallbacks.
pub fn default_binaries() -> Vec<Binary> {
    let spirv = DEFAULT_SPIRV_TOOLS_VERSION;
    let amber = "f231728f60cb3b0f21d7423aed24fd3b317f38c9";
    vec![
        binary(
            GLSLANG_VALIDATOR_NAME,
            &["Debug"],
            "1afa2b8cc57b92c6b769eb44a6854510b6921a0b",
        ),
        binary(SPIRV_OPT_NAME, &["Debug"], spirv),
        binary(SPIRV_DIS_NAME, &["Debug"], spirv),
        binary("spirv-as", &["Debug"], spirv),
        binary(SPIRV_VAL_NAME, &["Debug"], spirv),
        binary("spirv-fuzz", &["Debug"], spirv),
        binary("spirv-reduce", &["Debug"], spirv),
        binary(
            SWIFT_SHADER_NAME,
            &["Debug"],
            "cf79a622ec5c993fa48f8557c28e23b8407d1efd",
        ),
        binary(AMBER_NAME, &["Debug"], amber),
        binary("amber_apk", &["Debug"], amber),
        binary("amber_apk_test", &["Debug"], amber),
        binary(
            "graphicsfuzz-tool",
            &[],
            "7b143bcb3ad38b64ddc17d132886636b229b6684",
        ),
        binary(
            "amdllpc",
            &["Debug"],
            "c21d76dceaf26361f9b6b3838a955ec3301506b5",
        ),
    ]
}

/// A tool shipped inside a project's release archive.
struct Tool {
    name: &'static str,
    subpath: &'static str,
    exe_on_windows: bool,
}

impl Tool {
    const fn bin(name: &'static str, subpath: &'static str) -> Self {
        Self {
            name,
            subpath,
            exe_on_windows: true,
        }
    }
}

/// Derives the tag list from a platform suffix like `"Linux_x64_Debug"`.
pub fn tags_from_platform_suffix(suffix: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for platform in ["Linux", "Mac", "Windows"] {
        if suffix.contains(platform) {
            tags.push(platform.to_string());
            break;
        }
    }
    for common in ["Release", "Debug", "RelWithDebInfo", "x64"] {
        if suffix.contains(common) {
            tags.push(common.to_string());
        }
    }
    tags
}

/// Generates one recipe per platform suffix for a project built by the
/// `build-<project>` release pipeline.
fn build_repo_recipes(
    project: &str,
    version: &str,
    build_version: &str,
    suffixes: &[&str],
    tools: &[Tool],
) -> Vec<(ArtifactPath, Recipe)> {
    let mut result = Vec::with_capacity(suffixes.len());
    for suffix in suffixes {
        let tags = tags_from_platform_suffix(suffix);
        let windows = tags.iter().any(|t| t == "Windows");
        let binaries = tools
            .iter()
            .map(|tool| Binary {
                name: tool.name.to_string(),
                version: version.to_string(),
                tags: tags.clone(),
                path: if windows && tool.exe_on_windows {
                    format!("{project}/{}.exe", tool.subpath)
                } else {
                    format!("{project}/{}", tool.subpath)
                },
            })
            .collect();

        let artifact_path =
            ArtifactPath::from_static(format!("{BUILT_IN_PREFIX}/{project}_{version}_{suffix}"));
        let recipe = Recipe::DownloadAndExtractArchiveSet {
            archive_set: ArchiveSet {
                archives: vec![Archive {
                    url: format!(
                        "https://github.com/paulthomson/build-{project}/releases/download/github/paulthomson/build-{project}/{build_version}/build-{project}-{build_version}-{suffix}.zip"
                    ),
                    output_file: format!("{project}.zip"),
                    output_directory: project.to_string(),
                }],
                binaries,
            },
        };
        result.push((artifact_path, recipe));
    }
    result
}

fn spirv_tools_version(
    version: &str,
    build_version: &str,
    includes_spirv_fuzz: bool,
) -> Vec<(ArtifactPath, Recipe)> {
    let mut tools = vec![
        Tool::bin("spirv-as", "bin/spirv-as"),
        Tool::bin(SPIRV_DIS_NAME, "bin/spirv-dis"),
        Tool::bin(SPIRV_OPT_NAME, "bin/spirv-opt"),
        Tool::bin(SPIRV_VAL_NAME, "bin/spirv-val"),
    ];
    if includes_spirv_fuzz {
        tools.push(Tool::bin("spirv-fuzz", "bin/spirv-fuzz"));
    }
    let suffixes: Vec<&str> = PLATFORM_SUFFIXES_RELEASE
        .iter()
        .chain(PLATFORM_SUFFIXES_DEBUG)
        .copied()
        .collect();
    build_repo_recipes("SPIRV-Tools", version, build_version, &suffixes, &tools)
}

fn glslang_version(version: &str, build_version: &str) -> Vec<(ArtifactPath, Recipe)> {
    let suffixes: Vec<&str> = PLATFORM_SUFFIXES_RELEASE
        .iter()
        .chain(PLATFORM_SUFFIXES_DEBUG)
        .copied()
        .collect();
    build_repo_recipes(
        "glslang",
        version,
        build_version,
        &suffixes,
        &[Tool::bin(GLSLANG_VALIDATOR_NAME, "bin/glslangValidator")],
    )
}

fn swift_shader_version(version: &str, build_version: &str) -> Vec<(ArtifactPath, Recipe)> {
    let suffixes: Vec<&str> = PLATFORM_SUFFIXES_RELEASE
        .iter()
        .chain(PLATFORM_SUFFIXES_DEBUG)
        .chain(PLATFORM_SUFFIXES_RELWITHDEBINFO)
        .copied()
        .collect();
    build_repo_recipes(
        "swiftshader",
        version,
        build_version,
        &suffixes,
        &[Tool {
            name: SWIFT_SHADER_NAME,
            subpath: "lib/vk_swiftshader_icd.json",
            exe_on_windows: false,
        }],
    )
}

/// The GraphicsFuzz v1.2.1 bundle: one zip carrying release builds of
/// several tools for all three platforms.
fn graphicsfuzz_v121() -> (ArtifactPath, Recipe) {
    const GLSLANG_V: &str = "40c16ec0b3ad03fc170f1369a58e7bbe662d82cd";
    const SPIRV_V: &str = "a2ef7be242bcacaa9127a3ce011602ec54b2c9ed";

    let mut binaries = Vec::new();
    let tools: &[(&str, &str, &[&str])] = &[
        (GLSLANG_VALIDATOR_NAME, GLSLANG_V, &[]),
        (
            SPIRV_OPT_NAME,
            SPIRV_V,
            &[SPIRV_OPT_NO_VALIDATE_AFTER_ALL_TAG],
        ),
        (SPIRV_DIS_NAME, SPIRV_V, &[]),
        ("spirv-as", SPIRV_V, &[]),
        (SPIRV_VAL_NAME, SPIRV_V, &[]),
    ];
    for (name, version, extra_tags) in tools {
        for platform in ["Linux", "Windows", "Mac"] {
            let mut tags = vec![platform.to_string(), "x64".to_string(), "Release".to_string()];
            tags.extend(extra_tags.iter().map(|t| t.to_string()));
            let exe = if platform == "Windows" { ".exe" } else { "" };
            binaries.push(Binary {
                name: name.to_string(),
                version: version.to_string(),
                tags,
                path: format!("graphicsfuzz/bin/{platform}/{name}{exe}"),
            });
        }
    }

    (
        ArtifactPath::from_static(format!("{BUILT_IN_PREFIX}/graphicsfuzz_v1.2.1")),
        Recipe::DownloadAndExtractArchiveSet {
            archive_set: ArchiveSet {
                archives: vec![Archive {
                    url: "https://github.com/google/graphicsfuzz/releases/download/v1.2.1/graphicsfuzz.zip"
                        .to_string(),
                    output_file: "graphicsfuzz.zip".to_string(),
                    output_directory: "graphicsfuzz".to_string(),
                }],
                binaries,
            },
        },
    )
}

/// Builds the full built-in recipe map, oldest entries first.
pub fn built_in_recipes() -> RecipeMap {
    let mut entries: Vec<(ArtifactPath, Recipe)> = Vec::new();
    entries.extend(spirv_tools_version(
        "4a00a80c40484a6f6f72f48c9d34943cf8f180d4",
        "422f2fe0f0f32494fa687a12ba343d24863b330a",
        false,
    ));
    entries.extend(glslang_version(
        "9866ad9195cec8f266f16191fb4ec2ce4896e5c0",
        "1586e566f4949b1957e7c32454cbf27e501ed632",
    ));
    entries.extend(swift_shader_version(
        "a0b3a02601da8c48012a4259d335be04d00818da",
        "08fb8d429272ef8eedb4d610943b9fe59d336dc6",
    ));
    entries.push(graphicsfuzz_v121());
    entries.extend(spirv_tools_version(
        "1c1e749f0b51603032ed573acb5ee4cd6fee8d01",
        "7663d620a7fbdccb330d2baec138d0e3e096457c",
        false,
    ));
    entries.extend(spirv_tools_version(
        "55adf4cf707bb12c29fc12f784ebeaa29a819e9b",
        "f2170cc791d0eaa5789ec7528862ae00b984b3b8",
        false,
    ));
    entries.extend(glslang_version(
        "e383c5f55defdb884a77820483d3360617391d78",
        "f3df04d4f582af6b54989d7da86f58f8f38423ba",
    ));
    entries.extend(spirv_tools_version(
        "230c9e437146e48ec58adb4433890403c23c98fa",
        "288b0f57443e221df530b705085df59f2da93843",
        false,
    ));
    entries.extend(spirv_tools_version(
        "76b75c40a1e27939957e6a598292e9f32b4e98d4",
        "9debf645007ef2807ba68f4497d50638c4c57878",
        false,
    ));
    entries.extend(spirv_tools_version(
        "9559cdbdf011c487f67f89e2d694bd4a18d5c1e0",
        "693b9805d162d5a49592912f6b9bb2d0b4868ec8",
        true,
    ));
    entries.extend(glslang_version(
        "f04f1f93a70f4608ffa9903b20bfb95f20a063f5",
        "211afd921a2b354ee579cd4b60f761bfe27c1003",
    ));
    entries.extend(swift_shader_version(
        "fa0175c0988dd542f008257232207a8b87ad6c63",
        "ea3b929604da6873ace48988b8d4651bbcd2e573",
    ));
    entries.extend(swift_shader_version(
        "f25a1c68473b868ce61e97fe5b830c0cdd7e8181",
        "ad0a59319c4a3e23db2688c593a1e0459a99340d",
    ));
    entries.extend(spirv_tools_version(
        "06407250a169c6a03b3765e86619075af1a8c187",
        "04b2b8e2543b4643c533b20ca1a9d88c72fea370",
        true,
    ));
    entries.extend(glslang_version(
        "fe0b2bd694bb07004a2db859c5714c321c26b751",
        "0f167ce7125795df62ae5893f553e5608c9652f4",
    ));
    entries.extend(spirv_tools_version(
        "ad7f2c5c4c7f51360e9e079109a9217aa5ba5cc0",
        "b97215064186d731eac68adcc5ade4c7b96b265b",
        true,
    ));
    entries.extend(spirv_tools_version(
        "6b072126595dd8c2448eb1fda616251c5e6d7079",
        "74886e02e26453ee1dcba4290157e9c8a5e8d07e",
        true,
    ));
    entries.extend(swift_shader_version(
        "b6fa949c45397bd1fbfda769a104b9e8884f343e",
        "70e8d53b94227fed094975771d96f240f7d00911",
    ));
    entries.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_nonempty_and_under_built_in_prefix() {
        let recipes = built_in_recipes();
        assert!(recipes.len() > 100);
        for path in recipes.keys() {
            assert!(
                path.as_str().starts_with(BUILT_IN_PREFIX),
                "unexpected path {path}"
            );
        }
    }

    #[test]
    fn suffix_tags() {
        assert_eq!(
            tags_from_platform_suffix("Linux_x64_Debug"),
            vec!["Linux", "Debug", "x64"]
        );
        assert_eq!(
            tags_from_platform_suffix("Windows_x64_RelWithDebInfo"),
            vec!["Windows", "RelWithDebInfo", "x64"]
        );
    }

    #[test]
    fn windows_binaries_get_exe_suffix() {
        let recipes = built_in_recipes();
        let path = ArtifactPath::new(
            "//binaries/built_in/glslang_9866ad9195cec8f266f16191fb4ec2ce4896e5c0_Windows_x64_Release",
        )
        .unwrap();
        let Recipe::DownloadAndExtractArchiveSet { archive_set } = &recipes[&path];
        assert_eq!(
            archive_set.binaries[0].path,
            "glslang/bin/glslangValidator.exe"
        );
    }

    #[test]
    fn swiftshader_icd_never_gets_exe_suffix() {
        let recipes = built_in_recipes();
        let path = ArtifactPath::new(
            "//binaries/built_in/swiftshader_a0b3a02601da8c48012a4259d335be04d00818da_Windows_x64_Release",
        )
        .unwrap();
        let Recipe::DownloadAndExtractArchiveSet { archive_set } = &recipes[&path];
        assert_eq!(
            archive_set.binaries[0].path,
            "swiftshader/lib/vk_swiftshader_icd.json"
        );
    }

    #[test]
    fn graphicsfuzz_bundle_declares_fifteen_binaries() {
        let recipes = built_in_recipes();
        let path = ArtifactPath::new("//binaries/built_in/graphicsfuzz_v1.2.1").unwrap();
        let Recipe::DownloadAndExtractArchiveSet { archive_set } = &recipes[&path];
        assert_eq!(archive_set.binaries.len(), 15);
        let opt = archive_set
            .binaries
            .iter()
            .find(|b| b.name == SPIRV_OPT_NAME && b.tags.iter().any(|t| t == "Linux"))
            .unwrap();
        assert!(opt
            .tags
            .iter()
            .any(|t| t == SPIRV_OPT_NO_VALIDATE_AFTER_ALL_TAG));
        assert_eq!(opt.path, "graphicsfuzz/bin/Linux/spirv-opt");
    }

    #[test]
    fn default_binaries_share_the_spirv_tools_version() {
        let defaults = default_binaries();
        let opt = defaults.iter().find(|b| b.name == SPIRV_OPT_NAME).unwrap();
        let dis = defaults.iter().find(|b| b.name == SPIRV_DIS_NAME).unwrap();
        assert_eq!(opt.version, DEFAULT_SPIRV_TOOLS_VERSION);
        assert_eq!(opt.version, dis.version);
    }
}
