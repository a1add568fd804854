use std::collections::HashSet;

use cogbots::bot::Variant;
use cogbots::commands;

fn names(cmds: &[poise::Command<cogbots::Data, cogbots::Error>]) -> HashSet<&str> {
    cmds.iter().map(|cmd| cmd.name.as_str()).collect()
}

#[test]
fn test_music_commands() {
    let cmds = commands::music();
    let names = names(&cmds);

    let expected = [
        "help", "play", "p", "playnext", "pn", "skip", "s", "stop", "st", "queue", "q",
        "pause", "pa", "resume", "r", "nowplaying", "np", "loop", "l", "shuffle", "sh",
        "remove", "rm", "volume", "v", "lyrics",
    ];
    for name in expected {
        assert!(names.contains(name), "missing /{name}");
    }
    assert_eq!(cmds.len(), expected.len());
}

#[test]
fn test_dota_commands() {
    let cmds = commands::dota();
    assert_eq!(
        names(&cmds),
        HashSet::from(["help", "quiz", "gold", "top", "opendota_id"])
    );
}

#[test]
fn test_voice_commands() {
    let cmds = commands::voice();
    assert_eq!(
        names(&cmds),
        HashSet::from(["image", "lowpoly", "chad", "troll", "remix", "last"])
    );
}

#[test]
fn test_no_duplicate_names() {
    for variant in Variant::ALL {
        let cmds = variant.commands();
        assert_eq!(
            names(&cmds).len(),
            cmds.len(),
            "{} registers a name twice",
            variant.name()
        );
    }
}

#[test]
fn test_all_are_slash_commands_with_descriptions() {
    for variant in Variant::ALL {
        for cmd in variant.commands() {
            assert!(cmd.slash_action.is_some(), "/{} is not a slash command", cmd.name);
            assert!(cmd.description.is_some(), "/{} has no description", cmd.name);
        }
    }
}
