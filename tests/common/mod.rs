//! Shared fixtures for l5x-merge integration tests.
//!
//! `source()` is a small line project with nested data types, AOIs that
//! call each other, alarm definitions, and ladder plus ST logic.
//! `destination()` is a bare project with the same `Main` program shell and
//! three `NOP` rungs, ready to receive imports.

#![allow(dead_code)]

use l5x_merge::model::ComponentKind;
use l5x_merge::{ExportOptions, Project, Scope};

pub const SOURCE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<RSLogix5000Content SchemaRevision="1.0" SoftwareRevision="36.00" ContainsContext="false">
  <Controller Name="Line4" ProcessorType="1756-L83E" MajorRev="36" MinorRev="11">
    <DataTypes>
      <DataType Name="Alpha" Family="NoFamily" Class="User">
        <Members>
          <Member Name="Count" DataType="DINT" Dimension="0"/>
          <Member Name="Inner" DataType="Beta" Dimension="0"/>
        </Members>
      </DataType>
      <DataType Name="Beta" Family="NoFamily" Class="User">
        <Members>
          <Member Name="Flag" DataType="BOOL" Dimension="0"/>
          <Member Name="Level" DataType="REAL" Dimension="0"/>
        </Members>
      </DataType>
      <DataType Name="Unrelated" Family="NoFamily" Class="User">
        <Members>
          <Member Name="X" DataType="INT" Dimension="0"/>
        </Members>
      </DataType>
    </DataTypes>
    <AddOnInstructionDefinitions>
      <AddOnInstructionDefinition Name="Valve_Ctl" Revision="1.2" Class="Standard">
        <Parameters>
          <Parameter Name="EnableIn" DataType="BOOL" Usage="Input"/>
          <Parameter Name="EnableOut" DataType="BOOL" Usage="Output"/>
          <Parameter Name="Cfg" DataType="Beta" Usage="InOut"/>
        </Parameters>
        <LocalTags>
          <LocalTag Name="Filter" DataType="Debounce"/>
        </LocalTags>
        <Routines>
          <Routine Name="Logic" Type="RLL">
            <RLLContent>
              <Rung Number="0" Type="N"><Text><![CDATA[Debounce(Filter,Cfg.Flag);]]></Text></Rung>
            </RLLContent>
          </Routine>
        </Routines>
      </AddOnInstructionDefinition>
      <AddOnInstructionDefinition Name="Debounce" Revision="1.0" Class="Standard">
        <Parameters>
          <Parameter Name="EnableIn" DataType="BOOL" Usage="Input"/>
          <Parameter Name="In" DataType="BOOL" Usage="Input"/>
        </Parameters>
      </AddOnInstructionDefinition>
    </AddOnInstructionDefinitions>
    <AlarmDefinitions>
      <DatatypeAlarmDefinition Name="AlphaAlarms">
        <MemberAlarmDefinition Name="Alpha_High" Input="Count"/>
      </DatatypeAlarmDefinition>
    </AlarmDefinitions>
    <Tags>
      <Tag Name="Pump1" TagType="Base" DataType="Alpha">
        <AlarmConditions>
          <AlarmCondition Name="High" AlarmConditionDefinition="Alpha_High"/>
        </AlarmConditions>
      </Tag>
      <Tag Name="Limit" TagType="Base" DataType="DINT" Radix="Decimal"/>
      <Tag Name="Spare" TagType="Base" DataType="Unrelated"/>
    </Tags>
    <Programs>
      <Program Name="Main" Class="Standard" MainRoutineName="MainRoutine">
        <Tags>
          <Tag Name="Step" TagType="Base" DataType="DINT"/>
          <Tag Name="V1" TagType="Base" DataType="Valve_Ctl"/>
        </Tags>
        <Routines>
          <Routine Name="MainRoutine" Type="RLL">
            <RLLContent>
              <Rung Number="0" Type="N"><Text><![CDATA[XIC(Pump1.Inner.Flag)OTE(Step);]]></Text></Rung>
              <Rung Number="1" Type="N"><Text><![CDATA[Valve_Ctl(V1,Pump1.Inner);]]></Text></Rung>
              <Rung Number="2" Type="N"><Text><![CDATA[MOV(Limit,Step);]]></Text></Rung>
            </RLLContent>
          </Routine>
          <Routine Name="Calc" Type="ST">
            <STContent>
              <Line Number="0"><![CDATA[(* Spare feeds the old line,]]></Line>
              <Line Number="1"><![CDATA[   see Pump1 notes *)]]></Line>
              <Line Number="2"><![CDATA[Step := Limit + 1; // not Spare]]></Line>
            </STContent>
          </Routine>
        </Routines>
      </Program>
    </Programs>
  </Controller>
</RSLogix5000Content>
"#;

pub const DESTINATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<RSLogix5000Content SchemaRevision="1.0" SoftwareRevision="36.00" ContainsContext="false">
  <Controller Name="Line5" ProcessorType="1756-L83E" MajorRev="36" MinorRev="11">
    <DataTypes/>
    <AddOnInstructionDefinitions/>
    <Tags/>
    <Programs>
      <Program Name="Main" Class="Standard" MainRoutineName="MainRoutine">
        <Tags/>
        <Routines>
          <Routine Name="MainRoutine" Type="RLL">
            <RLLContent>
              <Rung Number="0" Type="N"><Text><![CDATA[NOP();]]></Text></Rung>
              <Rung Number="1" Type="N"><Text><![CDATA[NOP();]]></Text></Rung>
              <Rung Number="2" Type="N"><Text><![CDATA[NOP();]]></Text></Rung>
            </RLLContent>
          </Routine>
          <Routine Name="Calc" Type="ST">
            <STContent/>
          </Routine>
        </Routines>
      </Program>
    </Programs>
  </Controller>
</RSLogix5000Content>
"#;

pub fn source() -> Project {
    Project::parse(SOURCE).unwrap()
}

pub fn destination() -> Project {
    Project::parse(DESTINATION).unwrap()
}

pub fn options() -> ExportOptions {
    ExportOptions::default()
}

/// Names of every component of `kind` in `scope`, in document order.
pub fn names(project: &Project, kind: ComponentKind, scope: &Scope) -> Vec<String> {
    project
        .components(kind, scope)
        .map(|e| e.component_name().to_owned())
        .collect()
}

/// Rung texts of a ladder routine, in document order, with their numbers.
pub fn rungs(project: &Project, program: &str, routine: &str) -> Vec<(String, String)> {
    project
        .routine(program, routine)
        .unwrap()
        .child("RLLContent")
        .into_iter()
        .flat_map(|c| c.children_named("Rung"))
        .map(|r| {
            (
                r.attr("Number").unwrap_or_default().to_owned(),
                r.child("Text")
                    .and_then(|t| t.text())
                    .unwrap_or_default()
                    .trim()
                    .to_owned(),
            )
        })
        .collect()
}

/// Replace the members of data type `name` with one `Only:DINT` member.
pub fn redefine_data_type(project: &mut Project, name: &str) {
    let members = project
        .controller_mut()
        .child_mut("DataTypes")
        .and_then(|c| c.find_named_mut("DataType", name))
        .and_then(|dt| dt.child_mut("Members"))
        .unwrap();
    members.retain_children(|_| false);
    members.push_child(
        l5x_doc::Element::new("Member")
            .with_attr("Name", "Only")
            .with_attr("DataType", "DINT"),
    );
}
