//! Scrubs the yaml marshalling noise so annotated files diff cleanly
//! against their hand-written originals.

/// Removes empty `status: {}` lines, `creationTimestamp: null` lines and
/// `metadata:` keys that are left without children, and quotes cron
/// schedule values.
pub fn clean_output(out: &str) -> String {
    let lines: Vec<&str> = out.lines().collect();
    let mut buf = String::with_capacity(out.len());

    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        let indent_len = line.len() - trimmed.len();

        if trimmed == "status: {}" || trimmed == "creationTimestamp: null" {
            continue;
        }

        // A bare metadata: key is kept only when the next line is nested
        // under it; otherwise stripping its children above emptied it.
        if trimmed == "metadata:" && !has_nested_child(&lines, idx, indent_len) {
            continue;
        }

        if let Some(value) = trimmed.strip_prefix("schedule: ") {
            if !value.starts_with('"') {
                buf.push_str(&line[..indent_len]);
                buf.push_str(&format!("schedule: \"{value}\""));
                buf.push('\n');
                continue;
            }
        }

        buf.push_str(line);
        buf.push('\n');
    }

    buf
}

fn has_nested_child(lines: &[&str], idx: usize, indent_len: usize) -> bool {
    for line in lines.iter().skip(idx + 1) {
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        // Lines that would themselves be stripped don't count as children.
        if trimmed == "status: {}" || trimmed == "creationTimestamp: null" {
            continue;
        }
        let child_indent = line.len() - trimmed.len();
        // List items at the same indentation still belong to the parent
        // sequence, not to this mapping.
        return child_indent > indent_len && !trimmed.starts_with("- ");
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_noise_and_quotes_schedules() {
        let input = concat!(
            "- metadata:\n",
            "    annotations:\n",
            "      ssp.kubevirt.io/dict.architectures: amd64,arm64,s390x\n",
            "    creationTimestamp: null\n",
            "    name: centos-stream10-image-cron\n",
            "  spec:\n",
            "    garbageCollect: Outdated\n",
            "    managedDataSource: centos-stream10\n",
            "    schedule: 0 */12 * * *\n",
            "    template:\n",
            "      metadata:\n",
            "        creationTimestamp: null\n",
            "      spec:\n",
            "        source:\n",
            "          registry:\n",
            "            pullMethod: node\n",
            "            url: docker://quay.io/containerdisks/centos-stream:10\n",
            "      status: {}\n",
        );

        let expected = concat!(
            "- metadata:\n",
            "    annotations:\n",
            "      ssp.kubevirt.io/dict.architectures: amd64,arm64,s390x\n",
            "    name: centos-stream10-image-cron\n",
            "  spec:\n",
            "    garbageCollect: Outdated\n",
            "    managedDataSource: centos-stream10\n",
            "    schedule: \"0 */12 * * *\"\n",
            "    template:\n",
            "      spec:\n",
            "        source:\n",
            "          registry:\n",
            "            pullMethod: node\n",
            "            url: docker://quay.io/containerdisks/centos-stream:10\n",
        );

        assert_eq!(clean_output(input), expected);
    }

    #[test]
    fn keeps_populated_metadata_and_quoted_schedules() {
        let input = concat!(
            "- metadata:\n",
            "    name: fedora-image-cron\n",
            "  spec:\n",
            "    schedule: \"0 */12 * * *\"\n",
        );
        assert_eq!(clean_output(input), input);
    }
}
